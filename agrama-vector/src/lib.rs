//! HNSW semantic index over Matryoshka-truncated embeddings.
//!
//! [`store::SemanticIndex`] is the public entry point most callers want: it
//! owns key-to-node bookkeeping and the full/shadow graph composition over
//! the concrete [`hnsw::HnswIndex`] type. [`hnsw::HnswIndex`] and
//! [`brute_force::BruteForceBackend`] both separately implement the
//! [`backend::VectorIndexBackend`] trait so HNSW recall can be checked in
//! tests against an exact linear-scan reference.

pub mod backend;
pub mod brute_force;
pub mod distance;
pub mod error;
pub mod hnsw;
pub mod store;
pub mod types;

pub use backend::VectorIndexBackend;
pub use brute_force::BruteForceBackend;
pub use error::{VectorError, VectorResult};
pub use hnsw::HnswIndex;
pub use store::SemanticIndex;
pub use types::{HnswConfig, NodeId, VectorMatch};
