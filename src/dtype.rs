//! Numeric element types.
//!
//! [`DType`] names the element type of an array without carrying any data,
//! which is what traced values and dtype selection need. [`Element`] ties the
//! host Rust types to their `DType`.

use crate::array::Scalar;
use crate::misc::{default_floating_dtype, default_int_dtype};
use core::fmt;

/// Identifies the element type of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DType {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl DType {
    /// Returns `true` for floating-point dtypes.
    pub const fn is_floating(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Returns `true` for signed integer dtypes.
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    /// Size of one element in bytes.
    pub const fn itemsize(self) -> usize {
        match self {
            Self::Bool => 1,
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 => 8,
        }
    }

    /// The dtype of `array + scalar` for an array of this dtype.
    ///
    /// Scalars are weak: floating arrays keep their dtype, and integer arrays
    /// keep theirs unless the scalar is a float, which yields the default
    /// floating dtype. Boolean arrays stay boolean with a boolean scalar and
    /// otherwise take the default dtype of the scalar's kind. An `Int32`
    /// result widens to `Int64` when the integer scalar does not fit in 32
    /// bits.
    ///
    /// # Example
    /// ```
    /// use arbor::array::Scalar;
    /// use arbor::dtype::DType;
    /// assert_eq!(DType::Int32.promote_with_scalar(Scalar::Int(3)), DType::Int32);
    /// assert_eq!(DType::Int32.promote_with_scalar(Scalar::Int(1 << 40)), DType::Int64);
    /// assert_eq!(DType::Float64.promote_with_scalar(Scalar::Float(0.5)), DType::Float64);
    /// ```
    pub fn promote_with_scalar(self, scalar: Scalar) -> DType {
        match (self, scalar) {
            (d, _) if d.is_floating() => d,
            (_, Scalar::Float(_)) => default_floating_dtype(),
            (Self::Bool, Scalar::Bool(_)) => Self::Bool,
            (Self::Bool | Self::Int32, Scalar::Int(r)) => {
                let base = if self == Self::Bool {
                    default_int_dtype()
                } else {
                    Self::Int32
                };
                if base == Self::Int32 && i32::try_from(r).is_err() {
                    Self::Int64
                } else {
                    base
                }
            }
            (d, _) => d,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A host type that can be stored in a [`Tensor`](crate::tensors::Tensor).
///
/// Conversions go through `f64`, which is exact for every supported type
/// except `i64` values beyond 2^53.
pub trait Element: Copy + Send + Sync + PartialEq + fmt::Debug + 'static {
    /// The dtype this type is stored as.
    const DTYPE: DType;

    fn to_f64(self) -> f64;

    fn from_f64(value: f64) -> Self;
}

impl Element for bool {
    const DTYPE: DType = DType::Bool;

    fn to_f64(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }

    fn from_f64(value: f64) -> Self {
        value != 0.0
    }
}

impl Element for i32 {
    const DTYPE: DType = DType::Int32;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(value: f64) -> Self {
        value as i32
    }
}

impl Element for i64 {
    const DTYPE: DType = DType::Int64;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value as i64
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::Float32;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::Float64;

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}
