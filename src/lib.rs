//! arbor: tree, tracing and broadcasting helpers for differentiable array programs.
//!
//! The crate holds the small glue layer that model code leans on everywhere:
//! deciding what counts as an array, walking nested parameter structures,
//! noticing whether a computation is being traced, and picking default dtypes.
//!
//! # Modules
//!
//! - [`misc`]: `if_array`, `left_broadcast_to`, `currently_jitting`, `default_floating_dtype`.
//! - [`tensors`]: typed row-major tensors with reshape and broadcasting.
//! - [`array`]: dtype-erased values, concrete or traced, with scalar arithmetic.
//! - [`tracer`]: trace contexts, abstract values and `eval_shape`.
//! - [`filters`]: the `MaybeArray` capability and `is_array` family.
//! - [`tree`]: nested containers: flatten, unflatten, map, opaque leaves.
//! - [`config`]: the 64-bit precision flag, global and thread-scoped.
//! - [`dtype`] / [`error`]: element types and the crate error.
//!
//! # Example
//!
//! ```rust
//! use arbor::array::Value;
//! use arbor::misc::{currently_jitting, if_array, left_broadcast_to};
//! use arbor::tensor;
//! use arbor::tracer::trace;
//!
//! let x = Value::from(tensor!([1.0, 2.0]));
//! assert_eq!(if_array("batched").call(&x), Some("batched"));
//! assert_eq!(left_broadcast_to(&x, &[3, 2]).unwrap().shape(), &[3, 2]);
//! assert!(trace(|_| currently_jitting()));
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_panics_doc
)]
#![deny(unsafe_code)]

pub mod array;
pub mod config;
pub mod dtype;
pub mod error;
pub mod filters;
pub mod misc;
pub mod tensors;
pub mod tracer;
pub mod tree;

pub use error::{ArborError, Result};
