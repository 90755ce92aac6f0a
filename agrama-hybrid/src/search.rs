//! Hybrid search orchestrator: fan out to lexical, semantic, and graph
//! components, normalize, and fuse.
//!
//! Grounded on a stateless search orchestrator that holds `Arc` references
//! to its primitives and mirrors its select → allocate → search → fuse
//! pipeline, generalized from N storage-primitive facades down to the three
//! retrieval components this substrate exposes. Fan-out uses
//! `rayon::join` in place of that orchestrator's worker-pool dispatch.

use crate::error::HybridResult;
use crate::types::{HybridHit, HybridResponse, HybridWarnings, Weights};
use agrama_graph::{Direction, FreConfig, KnowledgeGraph};
use agrama_lexical::BM25Index;
use agrama_vector::SemanticIndex;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub type EmbedFn = Arc<dyn Fn(&str) -> Vec<f32> + Send + Sync>;

pub struct HybridSearch {
    lexical: Arc<BM25Index>,
    semantic: Arc<RwLock<SemanticIndex>>,
    graph: Arc<KnowledgeGraph>,
    embed: EmbedFn,
    graph_seed_depth: usize,
    graph_seed_count: usize,
}

impl HybridSearch {
    pub fn new(
        lexical: Arc<BM25Index>,
        semantic: Arc<RwLock<SemanticIndex>>,
        graph: Arc<KnowledgeGraph>,
        embed: EmbedFn,
    ) -> Self {
        HybridSearch {
            lexical,
            semantic,
            graph,
            embed,
            graph_seed_depth: 1,
            graph_seed_count: 5,
        }
    }

    /// `(text, α, β, γ, k)` hybrid query (filters are applied by the caller
    /// over the returned `doc_id`s, since components disagree on what a
    /// filterable field even is).
    #[tracing::instrument(skip(self), fields(k, alpha = weights.alpha, beta = weights.beta, gamma = weights.gamma))]
    pub fn search(&self, query: &str, weights: Weights, k: usize, ef_search: usize) -> HybridResult<HybridResponse> {
        let mut warnings = HybridWarnings::default();

        let (lexical_raw, semantic_raw) = rayon::join(
            || self.lexical_component(query, k.max(20)),
            || self.semantic_component(query, k.max(20), ef_search),
        );

        let (lexical_scores, lexical_warning) = lexical_raw;
        let (semantic_scores, semantic_warning) = semantic_raw;
        warnings.lexical = lexical_warning;
        warnings.semantic = semantic_warning;

        let mut seeds: Vec<String> = lexical_scores
            .iter()
            .chain(semantic_scores.iter())
            .map(|(id, _)| id.clone())
            .collect();
        seeds.sort();
        seeds.dedup();
        seeds.truncate(self.graph_seed_count);

        let (graph_scores, graph_warning) = self.graph_component(&seeds);
        warnings.graph = graph_warning;

        let lexical_norm = min_max_normalize(&lexical_scores);
        let semantic_norm = min_max_normalize(&semantic_scores);
        let graph_norm = min_max_normalize(&graph_scores);

        let mut doc_ids: Vec<String> = lexical_norm
            .keys()
            .chain(semantic_norm.keys())
            .chain(graph_norm.keys())
            .cloned()
            .collect();
        doc_ids.sort();
        doc_ids.dedup();

        let mut hits: Vec<HybridHit> = doc_ids
            .into_iter()
            .map(|doc_id| {
                let lexical_score = lexical_norm.get(&doc_id).copied().unwrap_or(0.0);
                let semantic_score = semantic_norm.get(&doc_id).copied().unwrap_or(0.0);
                let graph_score = graph_norm.get(&doc_id).copied().unwrap_or(0.0);
                let score = weights.alpha * lexical_score + weights.beta * semantic_score + weights.gamma * graph_score;
                HybridHit {
                    doc_id,
                    score,
                    lexical_score,
                    semantic_score,
                    graph_score,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        hits.truncate(k);

        Ok(HybridResponse { hits, warnings })
    }

    fn lexical_component(&self, query: &str, k: usize) -> (Vec<(String, f32)>, Option<String>) {
        let hits = self.lexical.search(query, k);
        (hits.into_iter().map(|h| (h.doc_id, h.score)).collect(), None)
    }

    fn semantic_component(&self, query: &str, k: usize, ef_search: usize) -> (Vec<(String, f32)>, Option<String>) {
        let embedding = (self.embed)(query);
        let index = self.semantic.read();
        match index.search(&embedding, k, ef_search) {
            Ok(hits) => (hits.into_iter().map(|m| (m.key, m.score)).collect(), None),
            Err(err) => {
                tracing::warn!(error = %err, "semantic component failed; contributing zero score");
                (Vec::new(), Some(err.to_string()))
            }
        }
    }

    fn graph_component(&self, seeds: &[String]) -> (Vec<(String, f32)>, Option<String>) {
        if seeds.is_empty() {
            return (Vec::new(), None);
        }
        let config = FreConfig::default();
        let mut best: HashMap<String, f32> = HashMap::new();
        let mut warning = None;
        for seed in seeds {
            match self.graph.dependencies(seed, self.graph_seed_depth, Direction::Both, &config) {
                Ok(traversal) => {
                    for hit in traversal {
                        let score = 1.0 / (1.0 + hit.distance as f32);
                        let entry = best.entry(hit.node).or_insert(0.0);
                        if score > *entry {
                            *entry = score;
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, seed = %seed, "graph seeding failed for this seed");
                    warning = Some(err.to_string());
                }
            }
        }
        (best.into_iter().collect(), warning)
    }
}

/// Min-max normalize onto `[0, 1]`. An empty set normalizes to empty; a set
/// where every score is equal normalizes to all `1.0` (every candidate is
/// equally the best available).
fn min_max_normalize(scores: &[(String, f32)]) -> HashMap<String, f32> {
    if scores.is_empty() {
        return HashMap::new();
    }
    let min = scores.iter().map(|(_, s)| *s).fold(f32::INFINITY, f32::min);
    let max = scores.iter().map(|(_, s)| *s).fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    scores
        .iter()
        .map(|(id, s)| {
            let normalized = if range > f32::EPSILON { (s - min) / range } else { 1.0 };
            (id.clone(), normalized)
        })
        .collect()
}
