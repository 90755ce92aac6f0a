//! Vector index configuration and identifier types.

/// Dense identifier for an indexed node, assigned on insert.
pub type NodeId = u32;

/// HNSW construction/query parameters.
#[derive(Debug, Clone)]
pub struct HnswConfig {
    /// Max connections per node per layer above layer 0.
    pub m: usize,
    /// Build-time beam width.
    pub ef_construction: usize,
    /// Query-time beam width.
    pub ef_search: usize,
    /// Level multiplier `1 / ln(m)`.
    pub ml: f64,
    /// Ordered Matryoshka prefix sizes enabled for the shadow-index fast path.
    pub matryoshka_dims: Vec<usize>,
}

impl HnswConfig {
    pub fn max_connections_layer0(&self) -> usize {
        self.m * 2
    }

    pub fn max_connections(&self) -> usize {
        self.m
    }
}

impl Default for HnswConfig {
    fn default() -> Self {
        let m = 16;
        HnswConfig {
            m,
            ef_construction: 200,
            ef_search: 50,
            ml: 1.0 / (m as f64).ln(),
            matryoshka_dims: vec![64, 256, 768],
        }
    }
}

/// A scored search result.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub id: NodeId,
    pub key: String,
    pub score: f32,
}
