//! Dtype-erased arrays.
//!
//! [`Value`] is what helpers and filters operate on: either concrete data
//! ([`ArrayData`], one variant per supported dtype) or an abstract
//! [`Tracer`] produced inside a trace context.
//!
//! Arithmetic follows one rule: whenever a trace is active on the current
//! thread, or an operand is already traced, the result is traced and no data
//! is computed.

use crate::dtype::{DType, Element};
use crate::error::{ArborError, Result};
use crate::tensors::{check_broadcast, Tensor};
use crate::tracer::{current_trace, Tracer};
use core::ops::Add;

/// Concrete array data, one variant per dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bool(Tensor<bool>),
    Int32(Tensor<i32>),
    Int64(Tensor<i64>),
    Float32(Tensor<f32>),
    Float64(Tensor<f64>),
}

/// Runs `$body` with `$t` bound to the inner tensor, whatever its dtype.
macro_rules! with_tensor {
    ($data:expr, $t:ident => $body:expr) => {
        match $data {
            ArrayData::Bool($t) => $body,
            ArrayData::Int32($t) => $body,
            ArrayData::Int64($t) => $body,
            ArrayData::Float32($t) => $body,
            ArrayData::Float64($t) => $body,
        }
    };
}

/// Rebuilds `ArrayData` in the variant matching the tensor it is given.
macro_rules! rewrap {
    ($data:expr, $t:ident => $body:expr) => {
        match $data {
            ArrayData::Bool($t) => ArrayData::Bool($body),
            ArrayData::Int32($t) => ArrayData::Int32($body),
            ArrayData::Int64($t) => ArrayData::Int64($body),
            ArrayData::Float32($t) => ArrayData::Float32($body),
            ArrayData::Float64($t) => ArrayData::Float64($body),
        }
    };
}

impl ArrayData {
    pub fn dtype(&self) -> DType {
        match self {
            Self::Bool(_) => DType::Bool,
            Self::Int32(_) => DType::Int32,
            Self::Int64(_) => DType::Int64,
            Self::Float32(_) => DType::Float32,
            Self::Float64(_) => DType::Float64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        with_tensor!(self, t => t.shape.as_slice())
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        with_tensor!(self, t => t.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # Errors
    /// [`ArborError::ReshapeMismatch`] if the element counts differ.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        Ok(rewrap!(self, t => t.clone().reshape(shape)?))
    }

    /// # Errors
    /// See [`Tensor::broadcast_to`].
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        Ok(rewrap!(self, t => t.broadcast_to(shape)?))
    }

    /// All elements converted to `f64`, in row-major order.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_tensor!(self, t => t.data.iter().map(|x| x.to_f64()).collect())
    }

    /// Borrows the inner tensor if it holds `T`.
    ///
    /// # Errors
    /// [`ArborError::DTypeMismatch`] for any other dtype.
    pub fn as_tensor<T: Element>(&self) -> Result<&Tensor<T>> {
        let found = self.dtype();
        let inner = with_tensor!(self, t => t as &dyn core::any::Any);
        inner
            .downcast_ref::<Tensor<T>>()
            .ok_or(ArborError::DTypeMismatch {
                expected: T::DTYPE,
                found,
            })
    }

    fn add_scalar(&self, rhs: Scalar) -> Self {
        let dtype = self.dtype().promote_with_scalar(rhs);
        let exact = match rhs {
            Scalar::Bool(b) => Some(i64::from(b)),
            Scalar::Int(r) => Some(r),
            Scalar::Float(_) => None,
        };
        // Integer results never go through f64.
        match (self, dtype, exact) {
            (Self::Int32(t), DType::Int32, Some(r)) => match i32::try_from(r) {
                Ok(r) => Self::Int32(t.map(move |x| x.wrapping_add(r))),
                Err(_) => Self::Int64(t.map(move |x| i64::from(x).wrapping_add(r))),
            },
            (Self::Int32(t), DType::Int64, Some(r)) => {
                Self::Int64(t.map(move |x| i64::from(x).wrapping_add(r)))
            }
            (Self::Int64(t), DType::Int64, Some(r)) => {
                Self::Int64(t.map(move |x| x.wrapping_add(r)))
            }
            (Self::Bool(t), DType::Int32, Some(r)) => match i32::try_from(r) {
                Ok(r) => Self::Int32(t.map(move |x| i32::from(x).wrapping_add(r))),
                Err(_) => Self::Int64(t.map(move |x| i64::from(x).wrapping_add(r))),
            },
            (Self::Bool(t), DType::Int64, Some(r)) => {
                Self::Int64(t.map(move |x| i64::from(x).wrapping_add(r)))
            }
            _ => with_tensor!(self, t => cast_add(t, dtype, rhs.to_f64())),
        }
    }
}

fn cast_add<T: Element>(t: &Tensor<T>, dtype: DType, rhs: f64) -> ArrayData {
    match dtype {
        DType::Bool => ArrayData::Bool(t.add_scalar(rhs)),
        DType::Int32 => ArrayData::Int32(t.add_scalar(rhs)),
        DType::Int64 => ArrayData::Int64(t.add_scalar(rhs)),
        DType::Float32 => ArrayData::Float32(t.add_scalar(rhs)),
        DType::Float64 => ArrayData::Float64(t.add_scalar(rhs)),
    }
}

macro_rules! impl_from_tensor {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Tensor<$t>> for ArrayData {
                fn from(t: Tensor<$t>) -> Self {
                    Self::$variant(t)
                }
            }

            impl From<Tensor<$t>> for Value {
                fn from(t: Tensor<$t>) -> Self {
                    Self::Concrete(ArrayData::$variant(t))
                }
            }

            impl From<$t> for Value {
                fn from(x: $t) -> Self {
                    Self::Concrete(ArrayData::$variant(Tensor::scalar(x)))
                }
            }
        )*
    };
}

impl_from_tensor!(
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
);

/// A host scalar used as the right operand of array arithmetic.
///
/// Scalars are weakly typed: they adapt to the array's dtype where they can.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Scalar {
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Bool(b) => b.to_f64(),
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f32> for Scalar {
    fn from(f: f32) -> Self {
        Self::Float(f64::from(f))
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

/// An array value, concrete or traced.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Concrete(ArrayData),
    Traced(Tracer),
}

impl Value {
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Concrete(data) => data.shape(),
            Self::Traced(t) => t.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn dtype(&self) -> DType {
        match self {
            Self::Concrete(data) => data.dtype(),
            Self::Traced(t) => t.dtype(),
        }
    }

    pub const fn is_traced(&self) -> bool {
        matches!(self, Self::Traced(_))
    }

    /// The underlying data.
    ///
    /// # Errors
    /// [`ArborError::ConcreteRequired`] for traced values.
    pub fn concrete(&self) -> Result<&ArrayData> {
        match self {
            Self::Concrete(data) => Ok(data),
            Self::Traced(_) => Err(ArborError::ConcreteRequired),
        }
    }

    /// # Errors
    /// [`ArborError::ReshapeMismatch`] if the element counts differ.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        match self {
            Self::Concrete(data) => Ok(Self::Concrete(data.reshape(shape)?)),
            Self::Traced(t) => {
                if t.shape().iter().product::<usize>() != shape.iter().product::<usize>() {
                    return Err(ArborError::ReshapeMismatch {
                        from: t.shape().to_vec(),
                        to: shape.to_vec(),
                    });
                }
                Ok(Self::Traced(t.with_shape(shape)))
            }
        }
    }

    /// Broadcasts to `shape` under numpy rules.
    ///
    /// # Errors
    /// See [`Tensor::broadcast_to`]. Traced values fail the same way.
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        match self {
            Self::Concrete(data) => Ok(Self::Concrete(data.broadcast_to(shape)?)),
            Self::Traced(t) => {
                check_broadcast(t.shape(), shape)?;
                Ok(Self::Traced(t.with_shape(shape)))
            }
        }
    }

    /// Adds a scalar elementwise.
    ///
    /// Inside a trace the result is a [`Tracer`] tagged with the innermost
    /// trace, whether or not `self` was concrete.
    pub fn add_scalar(&self, rhs: impl Into<Scalar>) -> Self {
        let rhs = rhs.into();
        let dtype = self.dtype().promote_with_scalar(rhs);
        match (self, current_trace()) {
            (Self::Concrete(data), None) => Self::Concrete(data.add_scalar(rhs)),
            (input, Some(trace)) => Self::Traced(Tracer::new(trace, input.shape(), dtype)),
            (Self::Traced(t), None) => Self::Traced(t.with_dtype(dtype)),
        }
    }
}

impl From<ArrayData> for Value {
    fn from(data: ArrayData) -> Self {
        Self::Concrete(data)
    }
}

impl From<Tracer> for Value {
    fn from(t: Tracer) -> Self {
        Self::Traced(t)
    }
}

impl<S: Into<Scalar>> Add<S> for Value {
    type Output = Value;

    fn add(self, rhs: S) -> Value {
        self.add_scalar(rhs)
    }
}

impl<S: Into<Scalar>> Add<S> for &Value {
    type Output = Value;

    fn add(self, rhs: S) -> Value {
        self.add_scalar(rhs)
    }
}
