//! Shared types for the Agrama knowledge substrate.
//!
//! This crate defines the types every other `agrama-*` crate builds on:
//! - [`AgentId`]: opaque identifier for a calling agent.
//! - [`Json`]: a tagged-union value used for metadata and primitive arguments.
//! - [`error`]: the unified error taxonomy.
//! - [`limits`]: size limits enforced at the boundary.
//! - [`Timestamp`]/[`Version`]: the store's logical clock types.

pub mod error;
pub mod json;
pub mod limits;
pub mod types;

pub use error::{AgramaError, Result, ValidationRule};
pub use json::Json;
pub use limits::Limits;
pub use types::{AgentId, Timestamp, Version};
