//! Graph engine error types.

use agrama_core::error::{AgramaError, ValidationRule};
use thiserror::Error;

pub type GraphResult<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph edge endpoint must not be empty")]
    EmptyEndpoint,

    #[error("relation tag must not be empty")]
    EmptyRelation,
}

impl From<GraphError> for AgramaError {
    fn from(err: GraphError) -> Self {
        let rule = match err {
            GraphError::EmptyEndpoint => ValidationRule::EmptyFrom,
            GraphError::EmptyRelation => ValidationRule::EmptyRelation,
        };
        AgramaError::validation(rule, err.to_string())
    }
}
