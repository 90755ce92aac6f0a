//! Vector index error types.

use agrama_core::error::{AgramaError, ValidationRule};
use thiserror::Error;

pub type VectorResult<T> = std::result::Result<T, VectorError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VectorError {
    #[error("embedding must not be empty")]
    EmptyVector,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector dimension {dim} exceeds configured maximum {max}")]
    DimensionTooLarge { dim: usize, max: usize },
}

impl From<VectorError> for AgramaError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::EmptyVector => AgramaError::validation(ValidationRule::EmptyValue, err.to_string()),
            VectorError::DimensionMismatch { .. } => {
                AgramaError::validation(ValidationRule::WrongType, err.to_string())
            }
            VectorError::DimensionTooLarge { .. } => AgramaError::ResourceExhausted(err.to_string()),
        }
    }
}
