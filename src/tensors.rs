//! Typed N-dimensional arrays.
//!
//! # Core Tensor Utilities
//!
//! [`Tensor<T>`] stores a shape and flat row-major data. It is the concrete
//! storage behind [`Value`](crate::array::Value) and supports the shape work
//! the helpers build on:
//!
//! - Construction, checked or panicking
//! - Reshaping with element-count checks
//! - Numpy-style broadcasting (right-aligned) and left-padded broadcasting
//! - Elementwise maps, parallelised with Rayon for large inputs
//!
//! ## Limitations
//! - Row-major only
//! - Broadcasting materialises the expanded data; there are no strided views
//!
//! ## Example
//!
//! ```rust
//! use arbor::tensors::Tensor;
//! let t = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! assert_eq!(t.shape, vec![2, 3]);
//! ```

use crate::dtype::Element;
use crate::error::{ArborError, Result};
use briny::prelude::*;
use rayon::prelude::*;

/// Element count above which elementwise maps run on the Rayon pool.
pub const PARALLEL_THRESHOLD: usize = 1 << 14;

/// Represents an N-dimensional tensor with a shape and flat row-major data.
///
/// - `shape` defines the structure, e.g. `[2, 3]` for a 2×3 matrix.
/// - `data` holds the flattened content in row-major order.
/// - A rank-0 tensor has an empty shape and exactly one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

/// Unchecked parts of a tensor, validated before use.
struct RawTensor<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T> Validate for RawTensor<T> {
    fn validate(&self) -> core::result::Result<(), ValidationError> {
        if self.data.len() != self.shape.iter().product::<usize>() {
            return Err(ValidationError);
        }
        Ok(())
    }
}

impl<T> Tensor<T> {
    /// Creates a new tensor with the given shape and flat data.
    ///
    /// # Panics
    /// Panics if the number of elements in `data` does not match the shape product.
    pub fn new(shape: impl Into<Vec<usize>>, data: Vec<T>) -> Self {
        let shape = shape.into();
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {:?} is incompatible with {} data elements",
            shape,
            data.len()
        );
        Self { shape, data }
    }

    /// Creates a tensor, reporting a mismatch instead of panicking.
    ///
    /// # Errors
    /// [`ArborError::DataLength`] if `data` does not fill `shape`.
    pub fn try_new(shape: impl Into<Vec<usize>>, data: Vec<T>) -> Result<Self> {
        let raw = RawTensor {
            shape: shape.into(),
            data,
        };
        let (shape, len) = (raw.shape.clone(), raw.data.len());
        let trusted =
            TrustedData::new(raw).map_err(|_| ArborError::DataLength { shape, len })?;
        let RawTensor { shape, data } = trusted.into_inner();
        Ok(Self { shape, data })
    }

    /// A rank-0 tensor holding `value`.
    pub fn scalar(value: T) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major strides, in elements.
    pub fn strides(&self) -> Vec<usize> {
        strides_of(&self.shape)
    }

    /// Returns the element at a multi-dimensional index, if in bounds.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.shape.len() || index.iter().zip(&self.shape).any(|(i, d)| i >= d) {
            return None;
        }
        let offset: usize = index.iter().zip(self.strides()).map(|(i, s)| i * s).sum();
        self.data.get(offset)
    }

    /// Reinterprets the data under a new shape.
    ///
    /// # Errors
    /// [`ArborError::ReshapeMismatch`] if the element counts differ.
    pub fn reshape(self, shape: &[usize]) -> Result<Self> {
        if shape.iter().product::<usize>() != self.data.len() {
            return Err(ArborError::ReshapeMismatch {
                from: self.shape,
                to: shape.to_vec(),
            });
        }
        Ok(Self {
            shape: shape.to_vec(),
            data: self.data,
        })
    }
}

impl<T: Clone> Tensor<T> {
    /// A tensor of `shape` with every element set to `value`.
    pub fn full(shape: impl Into<Vec<usize>>, value: T) -> Self {
        let shape = shape.into();
        let data = vec![value; shape.iter().product()];
        Self { shape, data }
    }

    /// Expands the tensor to `shape` under numpy broadcasting rules.
    ///
    /// Shapes are aligned from the right; each existing dimension must equal
    /// the target dimension or be 1.
    ///
    /// # Errors
    /// - [`ArborError::RankMismatch`] if `shape` has fewer dimensions.
    /// - [`ArborError::ShapeMismatch`] if a dimension is incompatible.
    ///
    /// # Example
    /// ```
    /// use arbor::tensors::Tensor;
    /// let row = Tensor::new(vec![1, 3], vec![1, 2, 3]);
    /// let grid = row.broadcast_to(&[2, 3]).unwrap();
    /// assert_eq!(grid.data, vec![1, 2, 3, 1, 2, 3]);
    /// ```
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        check_broadcast(&self.shape, shape)?;
        if self.shape == shape {
            return Ok(self.clone());
        }

        let pad = shape.len() - self.shape.len();
        let src_strides = self.strides();
        // Stride 0 on padded and size-1 axes repeats the source element.
        let strides: Vec<usize> = (0..shape.len())
            .map(|axis| match axis.checked_sub(pad) {
                Some(src) if self.shape[src] != 1 => src_strides[src],
                _ => 0,
            })
            .collect();

        let total: usize = shape.iter().product();
        let mut data = Vec::with_capacity(total);
        let mut index = vec![0usize; shape.len()];
        for _ in 0..total {
            let offset: usize = index.iter().zip(&strides).map(|(i, s)| i * s).sum();
            data.push(self.data[offset].clone());
            for axis in (0..shape.len()).rev() {
                index[axis] += 1;
                if index[axis] < shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }

        Ok(Self {
            shape: shape.to_vec(),
            data,
        })
    }

    /// Pads the shape with leading size-1 axes up to the rank of `shape`, then
    /// broadcasts to it.
    ///
    /// # Errors
    /// Same as [`Tensor::broadcast_to`].
    pub fn left_broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        let padded = left_pad_shape(&self.shape, shape.len())?;
        self.clone().reshape(&padded)?.broadcast_to(shape)
    }
}

impl<T: Element> Tensor<T> {
    /// A tensor of zeros.
    pub fn zeros(shape: impl Into<Vec<usize>>) -> Self {
        Self::full(shape, T::from_f64(0.0))
    }

    /// Applies `f` elementwise, producing a tensor of the same shape.
    pub fn map<U: Element>(&self, f: impl Fn(T) -> U + Sync + Send) -> Tensor<U> {
        let data = if self.data.len() >= PARALLEL_THRESHOLD {
            self.data.par_iter().map(|&x| f(x)).collect()
        } else {
            self.data.iter().map(|&x| f(x)).collect()
        };
        Tensor {
            shape: self.shape.clone(),
            data,
        }
    }

    /// Adds `rhs` to every element, converting the result to `U`.
    pub fn add_scalar<U: Element>(&self, rhs: f64) -> Tensor<U> {
        self.map(|x| U::from_f64(x.to_f64() + rhs))
    }
}

/// Row-major strides for `shape`.
pub fn strides_of(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Checks that `from` can be broadcast to `to` (right-aligned).
///
/// # Errors
/// [`ArborError::RankMismatch`] or [`ArborError::ShapeMismatch`].
pub fn check_broadcast(from: &[usize], to: &[usize]) -> Result<()> {
    if from.len() > to.len() {
        return Err(ArborError::RankMismatch {
            from: from.len(),
            to: to.len(),
        });
    }
    let pad = to.len() - from.len();
    let compatible = from
        .iter()
        .zip(&to[pad..])
        .all(|(&f, &t)| f == t || f == 1);
    if !compatible {
        return Err(ArborError::ShapeMismatch {
            from: from.to_vec(),
            to: to.to_vec(),
        });
    }
    Ok(())
}

/// The shape two operands broadcast to together.
///
/// # Errors
/// [`ArborError::ShapeMismatch`] if some aligned pair differs and neither is 1.
///
/// # Example
/// ```
/// use arbor::tensors::broadcast_shapes;
/// assert_eq!(broadcast_shapes(&[3, 1], &[4]).unwrap(), vec![3, 4]);
/// ```
pub fn broadcast_shapes(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let dim = |s: &[usize], axis: usize| {
        (axis + s.len())
            .checked_sub(ndim)
            .map_or(1, |i| s[i])
    };
    (0..ndim)
        .map(|axis| match (dim(a, axis), dim(b, axis)) {
            (x, y) if x == y => Ok(x),
            (1, y) => Ok(y),
            (x, 1) => Ok(x),
            _ => Err(ArborError::ShapeMismatch {
                from: a.to_vec(),
                to: b.to_vec(),
            }),
        })
        .collect()
}

/// `shape` with leading 1s added until it has `ndim` dimensions.
///
/// # Errors
/// [`ArborError::RankMismatch`] if `shape` already has more than `ndim`.
pub fn left_pad_shape(shape: &[usize], ndim: usize) -> Result<Vec<usize>> {
    let pad = ndim
        .checked_sub(shape.len())
        .ok_or(ArborError::RankMismatch {
            from: shape.len(),
            to: ndim,
        })?;
    let mut padded = vec![1; pad];
    padded.extend_from_slice(shape);
    Ok(padded)
}

/// `shape` with trailing 1s added until it has `ndim` dimensions.
///
/// # Errors
/// [`ArborError::RankMismatch`] if `shape` already has more than `ndim`.
pub fn right_pad_shape(shape: &[usize], ndim: usize) -> Result<Vec<usize>> {
    if shape.len() > ndim {
        return Err(ArborError::RankMismatch {
            from: shape.len(),
            to: ndim,
        });
    }
    let mut padded = shape.to_vec();
    padded.resize(ndim, 1);
    Ok(padded)
}

/// Defines a tensor from nested literal arrays.
///
/// Supports arbitrary dimensionality as long as sublists are uniform in shape.
///
/// # Example
/// ```
/// use arbor::tensor;
/// let t = tensor!([[1.0, 2.0], [3.0, 4.0]]);
/// assert_eq!(t.shape, vec![2, 2]);
/// ```
#[macro_export]
macro_rules! tensor {
    ($lit:literal) => {
        $crate::tensors::Tensor::new(Vec::<usize>::new(), vec![$lit])
    };

    ([ $( $inner:tt ),+ $(,)? ]) => {{
        let children = vec![ $( $crate::tensor!($inner) ),+ ];
        let first_shape = &children[0].shape;
        assert!(children.iter().all(|c| c.shape == *first_shape),
            "ragged tensor literal (rows have mismatched shapes)");
        let mut shape = vec![children.len()];
        shape.extend_from_slice(first_shape);
        let mut data = Vec::with_capacity(children.len() * children[0].data.len());
        for c in children { data.extend(c.data); }
        $crate::tensors::Tensor::new(shape, data)
    }};
}
