//! Small helpers shared across the crate.
//!
//! - [`if_array`] builds an [`IfArray`], a frozen callable that yields its
//!   value for arrays and `None` for anything else. It is handy as a
//!   per-leaf mapping when picking vmap-style axes over a parameter tree.
//! - [`left_broadcast_to`] pads an array with leading size-1 axes and then
//!   broadcasts it. [`broadcast_leading_to`] pads on the right instead, so a
//!   per-batch value spreads across trailing feature axes.
//! - [`currently_jitting`] reports whether the calling code runs inside a
//!   trace.
//! - [`default_floating_dtype`] picks `Float64` or `Float32` from the
//!   64-bit flag in [`crate::config`].

use crate::array::Value;
use crate::config::enable_x64;
use crate::dtype::DType;
use crate::error::Result;
use crate::filters::{is_array, MaybeArray};
use crate::tensors::{left_pad_shape, right_pad_shape};
use crate::tree::Static;

/// A callable that returns its value when evaluated on an array, and `None`
/// otherwise.
///
/// `IfArray` is immutable and compares by value. It is [`Static`]: tree walkers
/// treat it as a single opaque leaf and never look at what it holds.
///
/// # Example
/// ```
/// use arbor::misc::if_array;
/// use arbor::tensor;
///
/// let f = if_array(1);
/// assert_eq!(f.call(&tensor!([0, 1, 2])), Some(1));
/// assert_eq!(f.call(&true), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IfArray<V> {
    value: V,
}

impl<V> IfArray<V> {
    pub const fn new(value: V) -> Self {
        Self { value }
    }

    pub const fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }
}

impl<V: Clone> IfArray<V> {
    /// Returns the stored value if `x` is an array, else `None`.
    pub fn call<X: MaybeArray + ?Sized>(&self, x: &X) -> Option<V> {
        is_array(x).then(|| self.value.clone())
    }

    /// Borrows `self` as a closure, e.g. for [`Tree::map`](crate::tree::Tree::map).
    pub fn as_fn<X: MaybeArray + ?Sized>(&self) -> impl Fn(&X) -> Option<V> + '_ {
        move |x| self.call(x)
    }
}

impl<V> MaybeArray for IfArray<V> {}

impl<V> Static for IfArray<V> {}

/// Shorthand for [`IfArray::new`].
pub const fn if_array<V>(value: V) -> IfArray<V> {
    IfArray::new(value)
}

/// Broadcasts `arr` to `shape`, first padding its shape with leading size-1
/// axes up to the target rank.
///
/// The existing axes of `arr` line up with the trailing axes of `shape`.
///
/// # Errors
/// - [`ArborError::RankMismatch`](crate::error::ArborError::RankMismatch) if
///   `shape` has fewer dimensions than `arr`.
/// - [`ArborError::ShapeMismatch`](crate::error::ArborError::ShapeMismatch) if a
///   trailing dimension is incompatible.
///
/// # Example
/// ```
/// use arbor::array::Value;
/// use arbor::misc::left_broadcast_to;
/// use arbor::tensor;
///
/// let row = Value::from(tensor!([1, 2, 3, 4]));
/// let grid = left_broadcast_to(&row, &[3, 4]).unwrap();
/// assert_eq!(grid.shape(), &[3, 4]);
/// assert!(left_broadcast_to(&Value::from(tensor!([1, 2, 3, 4, 5])), &[3, 4]).is_err());
/// ```
pub fn left_broadcast_to(arr: &Value, shape: &[usize]) -> Result<Value> {
    let padded = left_pad_shape(arr.shape(), shape.len())?;
    log::trace!("left_broadcast_to: {:?} -> {:?} -> {:?}", arr.shape(), padded, shape);
    arr.reshape(&padded)?.broadcast_to(shape)
}

/// Broadcasts `arr` to `shape`, padding its shape with trailing size-1 axes.
///
/// The existing axes of `arr` line up with the leading axes of `shape`, so a
/// per-batch `(B,)` vector spreads across trailing feature axes `(B, F, ...)`.
///
/// # Errors
/// Same as [`left_broadcast_to`].
///
/// # Example
/// ```
/// use arbor::array::Value;
/// use arbor::misc::broadcast_leading_to;
/// use arbor::tensor;
///
/// let per_batch = Value::from(tensor!([1, 2]));
/// let out = broadcast_leading_to(&per_batch, &[2, 3]).unwrap();
/// assert_eq!(out.concrete().unwrap().to_f64_vec(), vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
/// ```
pub fn broadcast_leading_to(arr: &Value, shape: &[usize]) -> Result<Value> {
    let padded = right_pad_shape(arr.shape(), shape.len())?;
    log::trace!("broadcast_leading_to: {:?} -> {:?} -> {:?}", arr.shape(), padded, shape);
    arr.reshape(&padded)?.broadcast_to(shape)
}

/// Returns `true` when called inside a trace, `false` when evaluating eagerly.
///
/// Adds a scalar to a fresh array and checks whether the result came back
/// abstract.
///
/// # Example
/// ```
/// use arbor::misc::currently_jitting;
/// use arbor::tracer::trace;
///
/// assert!(!currently_jitting());
/// assert!(trace(|_| currently_jitting()));
/// ```
pub fn currently_jitting() -> bool {
    matches!(Value::from(1i32) + 1, Value::Traced(_))
}

/// `Float64` when 64-bit mode is enabled, `Float32` otherwise.
///
/// # Example
/// ```
/// use arbor::config::with_x64;
/// use arbor::dtype::DType;
/// use arbor::misc::default_floating_dtype;
///
/// assert_eq!(with_x64(true, default_floating_dtype), DType::Float64);
/// assert_eq!(with_x64(false, default_floating_dtype), DType::Float32);
/// ```
pub fn default_floating_dtype() -> DType {
    if enable_x64() {
        DType::Float64
    } else {
        DType::Float32
    }
}

/// `Int64` when 64-bit mode is enabled, `Int32` otherwise.
pub fn default_int_dtype() -> DType {
    if enable_x64() {
        DType::Int64
    } else {
        DType::Int32
    }
}
