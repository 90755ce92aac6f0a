//! Size limits enforced by the engine at the validation boundary.
//!
//! Violations return [`AgramaError::ResourceExhausted`](crate::error::AgramaError),
//! never a panic. Defaults are generous; callers construct a custom
//! [`Limits`] when opening the engine to tighten them.

/// Size limits for keys, values, metadata, and vectors.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum key length in bytes (default: 1024).
    pub max_key_bytes: usize,
    /// Maximum value length in bytes (default: 8 MiB).
    pub max_value_bytes: usize,
    /// Maximum metadata JSON nesting depth (default: 32).
    pub max_metadata_depth: usize,
    /// Maximum number of history entries retained per key (default: unbounded = `usize::MAX`).
    pub max_history_len: usize,
    /// Maximum embedding dimensionality (default: 8192).
    pub max_vector_dim: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_key_bytes: 1024,
            max_value_bytes: 8 * 1024 * 1024,
            max_metadata_depth: 32,
            max_history_len: usize::MAX,
            max_vector_dim: 8192,
        }
    }
}
