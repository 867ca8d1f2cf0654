//! Error type shared by every fallible operation in the crate.

use crate::dtype::DType;

/// Everything that can go wrong when shaping, tracing or rebuilding values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArborError {
    /// A shape cannot be broadcast to the requested target.
    #[error("cannot broadcast shape {from:?} to {to:?}")]
    ShapeMismatch { from: Vec<usize>, to: Vec<usize> },

    /// The target has fewer dimensions than the input.
    #[error("cannot broadcast rank {from} to lower rank {to}")]
    RankMismatch { from: usize, to: usize },

    /// A reshape would change the number of elements.
    #[error("cannot reshape {from:?} into {to:?}")]
    ReshapeMismatch { from: Vec<usize>, to: Vec<usize> },

    /// The flat data does not fill the shape.
    #[error("shape {shape:?} is incompatible with {len} data elements")]
    DataLength { shape: Vec<usize>, len: usize },

    #[error("expected dtype {expected}, found {found}")]
    DTypeMismatch { expected: DType, found: DType },

    /// Unflattening received the wrong number of leaves.
    #[error("tree expects {expected} leaves, got {found}")]
    TreeStructure { expected: usize, found: usize },

    /// Data was requested from an abstract traced value.
    #[error("concrete data requested from a traced value")]
    ConcreteRequired,

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Crate-wide result alias.
pub type Result<T, E = ArborError> = core::result::Result<T, E>;
