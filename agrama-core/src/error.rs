//! Unified error taxonomy.
//!
//! Every fallible operation in the substrate returns [`Result<T>`]. Errors
//! never carry filesystem paths, internal addresses, or stack details —
//! they name the failed operation and the violated rule or kind.

use thiserror::Error;

/// Result type alias used throughout the substrate.
pub type Result<T> = std::result::Result<T, AgramaError>;

/// A named validation rule, surfaced on input-validation failures so callers
/// can distinguish "empty key" from "weights don't sum to one" without
/// parsing the message string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    EmptyKey,
    EmptyValue,
    EmptyQuery,
    EmptyFrom,
    EmptyTo,
    EmptyRelation,
    EmptyType,
    WrongType,
    UnknownOperation,
    UnknownSearchType,
    UnknownPrimitive,
    WeightsDoNotSumToOne,
}

impl std::fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValidationRule::EmptyKey => "empty_key",
            ValidationRule::EmptyValue => "empty_value",
            ValidationRule::EmptyQuery => "empty_query",
            ValidationRule::EmptyFrom => "empty_from",
            ValidationRule::EmptyTo => "empty_to",
            ValidationRule::EmptyRelation => "empty_relation",
            ValidationRule::EmptyType => "empty_type",
            ValidationRule::WrongType => "wrong_type",
            ValidationRule::UnknownOperation => "unknown_operation",
            ValidationRule::UnknownSearchType => "unknown_search_type",
            ValidationRule::UnknownPrimitive => "unknown_primitive",
            ValidationRule::WeightsDoNotSumToOne => "weights_do_not_sum_to_one",
        };
        f.write_str(s)
    }
}

/// The unified error type for all Agrama APIs.
#[derive(Debug, Error)]
pub enum AgramaError {
    /// Input validation failed before any side effect occurred.
    #[error("validation failed ({rule}): {message}")]
    Validation {
        rule: ValidationRule,
        message: String,
    },

    /// Allocation failure, pool exhaustion, or a size limit was exceeded.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The call's deadline expired during fan-out.
    #[error("deadline exceeded during {operation}")]
    DeadlineExceeded { operation: String },

    /// A state the engine believes impossible. Fatal for the call; details
    /// are logged via `tracing::error!`, never included in the message
    /// returned to the caller.
    #[error("internal error")]
    Internal,
}

impl AgramaError {
    pub fn validation(rule: ValidationRule, message: impl Into<String>) -> Self {
        AgramaError::Validation {
            rule,
            message: message.into(),
        }
    }

    /// Stable numeric code for the tool-call protocol boundary.
    pub fn code(&self) -> i32 {
        match self {
            AgramaError::Validation { .. } => 400,
            AgramaError::ResourceExhausted(_) => 429,
            AgramaError::DeadlineExceeded { .. } => 504,
            AgramaError::Internal => 500,
        }
    }
}
