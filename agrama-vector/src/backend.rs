//! Pluggable vector index backend trait.
//!
//! Both [`crate::hnsw::HnswIndex`] and [`crate::brute_force::BruteForceBackend`]
//! implement this trait, so HNSW recall can be checked in tests against an
//! exact linear-scan reference. [`SemanticIndex`](crate::store::SemanticIndex)
//! itself is written directly against the concrete `HnswIndex` type, not
//! against this trait object: it needs `HnswIndex`-specific operations
//! (per-dimension shadow construction, full-precision re-rank lookups) that
//! the trait does not expose.

use crate::types::NodeId;

pub trait VectorIndexBackend: Send + Sync {
    fn insert(&mut self, id: NodeId, embedding: Vec<f32>);
    fn search(&self, query: &[f32], k: usize) -> Vec<(NodeId, f32)>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn get(&self, id: NodeId) -> Option<&[f32]>;
}
