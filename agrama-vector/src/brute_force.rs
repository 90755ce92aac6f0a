//! Exact nearest-neighbor reference backend.
//!
//! Used to validate HNSW recall in tests and as the fallback backend for
//! indexes small enough that an approximate structure buys nothing.

use crate::backend::VectorIndexBackend;
use crate::distance::cosine_similarity;
use crate::types::NodeId;
use std::collections::BTreeMap;

pub struct BruteForceBackend {
    embeddings: BTreeMap<NodeId, Vec<f32>>,
}

impl BruteForceBackend {
    pub fn new() -> Self {
        BruteForceBackend {
            embeddings: BTreeMap::new(),
        }
    }
}

impl Default for BruteForceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorIndexBackend for BruteForceBackend {
    fn insert(&mut self, id: NodeId, embedding: Vec<f32>) {
        self.embeddings.insert(id, embedding);
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(NodeId, f32)> {
        let mut scored: Vec<(NodeId, f32)> = self
            .embeddings
            .iter()
            .map(|(&id, emb)| (id, cosine_similarity(query, emb)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        scored
    }

    fn len(&self) -> usize {
        self.embeddings.len()
    }

    fn get(&self, id: NodeId) -> Option<&[f32]> {
        self.embeddings.get(&id).map(|v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brute_force_finds_exact_self_match() {
        let mut backend = BruteForceBackend::new();
        backend.insert(0, vec![1.0, 0.0, 0.0]);
        backend.insert(1, vec![0.0, 1.0, 0.0]);
        let results = backend.search(&[1.0, 0.0, 0.0], 1);
        assert_eq!(results[0].0, 0);
    }

    #[test]
    fn brute_force_truncates_to_k() {
        let mut backend = BruteForceBackend::new();
        for i in 0..10u32 {
            backend.insert(i, vec![i as f32, 0.0]);
        }
        assert_eq!(backend.search(&[0.0, 0.0], 3).len(), 3);
    }
}
