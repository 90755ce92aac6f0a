//! Semantic index façade: a full-dimension HNSW graph plus a set of
//! Matryoshka shadow graphs over truncated-and-renormalized prefixes of the
//! same embeddings.
//!
//! A query first narrows candidates against the smallest configured shadow
//! dimension, then re-ranks that candidate pool against the full-dimension
//! vectors. This trades a small amount of recall for a much cheaper beam
//! search when embeddings are wide (typical configurations use 768-dimension
//! embeddings with 64/256 shadow prefixes).

use crate::distance::normalize_in_place;
use crate::error::{VectorError, VectorResult};
use crate::hnsw::HnswIndex;
use crate::types::{HnswConfig, NodeId, VectorMatch};
use std::collections::HashMap;

struct Shadow {
    dim: usize,
    index: HnswIndex,
}

pub struct SemanticIndex {
    config: HnswConfig,
    max_dim: usize,
    dim: Option<usize>,
    next_id: NodeId,
    key_to_id: HashMap<String, NodeId>,
    id_to_key: HashMap<NodeId, String>,
    full: Option<HnswIndex>,
    shadows: Vec<Shadow>,
}

impl SemanticIndex {
    pub fn new(config: HnswConfig, max_dim: usize) -> Self {
        SemanticIndex {
            config,
            max_dim,
            dim: None,
            next_id: 0,
            key_to_id: HashMap::new(),
            id_to_key: HashMap::new(),
            full: None,
            shadows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.key_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_to_id.is_empty()
    }

    fn validate(&self, embedding: &[f32]) -> VectorResult<()> {
        if embedding.is_empty() {
            return Err(VectorError::EmptyVector);
        }
        if embedding.len() > self.max_dim {
            return Err(VectorError::DimensionTooLarge {
                dim: embedding.len(),
                max: self.max_dim,
            });
        }
        if let Some(expected) = self.dim {
            if embedding.len() != expected {
                return Err(VectorError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        Ok(())
    }

    /// Insert or replace the embedding stored under `key`. Vectors are
    /// defensively renormalized to unit length regardless of their input
    /// magnitude.
    #[tracing::instrument(skip(self, embedding), fields(key = %key, dim = embedding.len()))]
    pub fn insert(&mut self, key: &str, embedding: Vec<f32>) -> VectorResult<()> {
        self.validate(&embedding)?;
        let dim = embedding.len();
        if self.dim.is_none() {
            self.dim = Some(dim);
            self.full = Some(HnswIndex::new(dim, self.config.clone()));
            let mut shadow_dims: Vec<usize> = self
                .config
                .matryoshka_dims
                .iter()
                .copied()
                .filter(|&d| d < dim)
                .collect();
            shadow_dims.sort_unstable();
            shadow_dims.dedup();
            self.shadows = shadow_dims
                .into_iter()
                .map(|d| Shadow {
                    dim: d,
                    index: HnswIndex::new(d, self.config.clone()),
                })
                .collect();
        }

        let mut unit = embedding;
        normalize_in_place(&mut unit);

        let id = if let Some(&existing) = self.key_to_id.get(key) {
            existing
        } else {
            let id = self.next_id;
            self.next_id += 1;
            self.key_to_id.insert(key.to_string(), id);
            self.id_to_key.insert(id, key.to_string());
            id
        };

        if let Some(full) = self.full.as_mut() {
            full.insert(id, unit.clone());
        }
        for shadow in self.shadows.iter_mut() {
            let mut truncated: Vec<f32> = unit[..shadow.dim].to_vec();
            normalize_in_place(&mut truncated);
            shadow.index.insert(id, truncated);
        }

        tracing::trace!(id, "semantic index: embedding stored");
        Ok(())
    }

    /// Query for the `k` nearest stored embeddings (the semantic `search`
    /// variant).
    #[tracing::instrument(skip(self, query), fields(query_dim = query.len(), k))]
    pub fn search(&self, query: &[f32], k: usize, ef_search: usize) -> VectorResult<Vec<VectorMatch>> {
        self.validate(query)?;
        let Some(full) = self.full.as_ref() else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut unit = query.to_vec();
        normalize_in_place(&mut unit);

        let raw = if let Some(smallest) = self.shadows.first() {
            self.search_via_shadow(smallest, &unit, full, k, ef_search)
        } else {
            full.search(&unit, k, ef_search)
        };

        Ok(raw
            .into_iter()
            .filter_map(|(id, score)| {
                self.id_to_key.get(&id).map(|key| VectorMatch {
                    id,
                    key: key.clone(),
                    score,
                })
            })
            .collect())
    }

    fn search_via_shadow(
        &self,
        shadow: &Shadow,
        query: &[f32],
        full: &HnswIndex,
        k: usize,
        ef_search: usize,
    ) -> Vec<(NodeId, f32)> {
        let mut truncated: Vec<f32> = query[..shadow.dim].to_vec();
        normalize_in_place(&mut truncated);

        // Open question resolution: the re-rank candidate pool width
        // defaults to ef_search at full dimension.
        let candidate_pool = shadow.index.search(&truncated, ef_search, ef_search);

        let mut reranked: Vec<(NodeId, f32)> = candidate_pool
            .into_iter()
            .filter_map(|(id, _)| full.get(id).map(|emb| (id, crate::distance::cosine_similarity(query, emb))))
            .collect();
        reranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
        reranked.truncate(k);
        reranked
    }
}
