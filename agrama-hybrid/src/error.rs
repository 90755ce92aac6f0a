//! Hybrid search error types.

use agrama_core::error::{AgramaError, ValidationRule};
use thiserror::Error;

pub type HybridResult<T> = std::result::Result<T, HybridError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HybridError {
    #[error("weights must sum to 1.0 within 1e-6, got alpha={alpha} beta={beta} gamma={gamma} (sum={sum})")]
    WeightsInvalid {
        alpha: f32,
        beta: f32,
        gamma: f32,
        sum: f32,
    },

    #[error("query must not be empty")]
    EmptyQuery,
}

impl From<HybridError> for AgramaError {
    fn from(err: HybridError) -> Self {
        let rule = match err {
            HybridError::WeightsInvalid { .. } => ValidationRule::WeightsDoNotSumToOne,
            HybridError::EmptyQuery => ValidationRule::EmptyQuery,
        };
        AgramaError::validation(rule, err.to_string())
    }
}
