//! Hybrid search request/result types.

use crate::error::{HybridError, HybridResult};

/// Fusion weights: `combined = alpha * lexical + beta * semantic + gamma *
/// graph`. Must sum to `1.0` within `1e-6`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl Weights {
    pub fn new(alpha: f32, beta: f32, gamma: f32) -> HybridResult<Self> {
        let sum = alpha + beta + gamma;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(HybridError::WeightsInvalid {
                alpha,
                beta,
                gamma,
                sum,
            });
        }
        Ok(Weights { alpha, beta, gamma })
    }
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            alpha: 0.4,
            beta: 0.4,
            gamma: 0.2,
        }
    }
}

/// A single fused search result.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridHit {
    pub doc_id: String,
    pub score: f32,
    pub lexical_score: f32,
    pub semantic_score: f32,
    pub graph_score: f32,
}

/// Non-fatal issues encountered while fanning out to components; the
/// corresponding component contributed a zero score rather than aborting
/// the whole search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HybridWarnings {
    pub lexical: Option<String>,
    pub semantic: Option<String>,
    pub graph: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HybridResponse {
    pub hits: Vec<HybridHit>,
    pub warnings: HybridWarnings,
}
