use thiserror::Error;

use crate::dtype::{DType, DTypeClass};
use crate::value::Shape;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("shape {0} holds more elements than usize can count")]
    ShapeOverflow(Shape),

    #[error("shape mismatch: shape holds {expected} elements, data has {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("dtype {dtype} cannot hold {data} data")]
    DTypeMismatch { dtype: DType, data: DTypeClass },

    #[error("invalid {dtype} element: {reason}")]
    InvalidElement { dtype: DType, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}
