//! Classifying values as arrays.
//!
//! [`MaybeArray`] is the capability the helpers query. Implementors say whether
//! they are an array (concrete or traced) and, if so, their dtype. Everything
//! else keeps the default: not an array.
//!
//! | Type | `is_array` | `is_array_like` |
//! |---|---|---|
//! | `Tensor<T>`, `ArrayData`, `Value`, `Tracer` | yes | yes |
//! | `bool`, integers, floats | no | yes |
//! | `str`, `String`, `()` | no | no |
//! | `Option<T>` | `Some` delegates, `None` no | same |

use crate::array::{ArrayData, Value};
use crate::dtype::{DType, Element};
use crate::tensors::Tensor;
use crate::tracer::Tracer;

/// A value that may be an array.
pub trait MaybeArray {
    /// The element dtype when `self` is an array.
    fn array_dtype(&self) -> Option<DType> {
        None
    }

    /// The dtype `self` takes when converted to an array.
    ///
    /// Arrays report their own dtype. Host scalars report the widest dtype
    /// of their kind.
    fn array_like_dtype(&self) -> Option<DType> {
        self.array_dtype()
    }

    /// `true` for concrete arrays and traced placeholders.
    fn is_array(&self) -> bool {
        self.array_dtype().is_some()
    }

    /// `true` for arrays and for host scalars that convert to arrays.
    fn is_array_like(&self) -> bool {
        self.array_like_dtype().is_some()
    }
}

impl<T: Element> MaybeArray for Tensor<T> {
    fn array_dtype(&self) -> Option<DType> {
        Some(T::DTYPE)
    }
}

impl MaybeArray for ArrayData {
    fn array_dtype(&self) -> Option<DType> {
        Some(self.dtype())
    }
}

impl MaybeArray for Tracer {
    fn array_dtype(&self) -> Option<DType> {
        Some(self.dtype())
    }
}

impl MaybeArray for Value {
    fn array_dtype(&self) -> Option<DType> {
        Some(self.dtype())
    }
}

macro_rules! host_scalar {
    ($dtype:expr => $($t:ty),*) => {
        $(
            impl MaybeArray for $t {
                fn array_like_dtype(&self) -> Option<DType> {
                    Some($dtype)
                }
            }
        )*
    };
}

host_scalar!(DType::Bool => bool);
host_scalar!(DType::Int64 => i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);
host_scalar!(DType::Float64 => f32, f64);

impl MaybeArray for str {}

impl MaybeArray for String {}

impl MaybeArray for () {}

impl<T: MaybeArray> MaybeArray for Option<T> {
    fn array_dtype(&self) -> Option<DType> {
        self.as_ref().and_then(MaybeArray::array_dtype)
    }

    fn array_like_dtype(&self) -> Option<DType> {
        self.as_ref().and_then(MaybeArray::array_like_dtype)
    }
}

impl<T: MaybeArray + ?Sized> MaybeArray for &T {
    fn array_dtype(&self) -> Option<DType> {
        (**self).array_dtype()
    }

    fn array_like_dtype(&self) -> Option<DType> {
        (**self).array_like_dtype()
    }
}

/// Returns `true` if `x` is an array, including traced placeholders.
///
/// # Example
/// ```
/// use arbor::filters::is_array;
/// use arbor::tensor;
/// assert!(is_array(&tensor!([1, 2, 3])));
/// assert!(!is_array(&1.0));
/// ```
pub fn is_array<X: MaybeArray + ?Sized>(x: &X) -> bool {
    x.is_array()
}

/// Returns `true` for arrays and host scalars.
pub fn is_array_like<X: MaybeArray + ?Sized>(x: &X) -> bool {
    x.is_array_like()
}

/// Returns `true` for arrays with a floating-point dtype.
pub fn is_inexact_array<X: MaybeArray + ?Sized>(x: &X) -> bool {
    x.array_dtype().is_some_and(DType::is_floating)
}

/// Returns `true` for floating arrays and floating host scalars.
pub fn is_inexact_array_like<X: MaybeArray + ?Sized>(x: &X) -> bool {
    x.array_like_dtype().is_some_and(DType::is_floating)
}
