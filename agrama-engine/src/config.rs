//! Engine configuration, mirroring the recognized option set: construction
//! parameters for the HNSW, FRE, BM25, hybrid-weight, and response-cache
//! subsystems. No file loading lives here — that belongs to the layer
//! embedding this crate, not the engine itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HnswSettings {
    #[serde(default = "default_hnsw_m")]
    pub m: usize,
    #[serde(default = "default_ef_construction")]
    pub ef_construction: usize,
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,
    #[serde(default = "default_dim")]
    pub dim: usize,
    #[serde(default = "default_matryoshka_dims")]
    pub matryoshka_dims: Vec<usize>,
}

fn default_hnsw_m() -> usize {
    16
}
fn default_ef_construction() -> usize {
    200
}
fn default_ef_search() -> usize {
    50
}
fn default_dim() -> usize {
    768
}
fn default_matryoshka_dims() -> Vec<usize> {
    vec![64, 256, 768]
}

impl Default for HnswSettings {
    fn default() -> Self {
        HnswSettings {
            m: default_hnsw_m(),
            ef_construction: default_ef_construction(),
            ef_search: default_ef_search(),
            dim: default_dim(),
            matryoshka_dims: default_matryoshka_dims(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FreSettings {
    #[serde(default = "default_max_frontier")]
    pub max_frontier: usize,
    #[serde(default = "default_pivot_fraction")]
    pub pivot_fraction: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_frontier() -> usize {
    2000
}
fn default_pivot_fraction() -> f64 {
    0.05
}
fn default_max_depth() -> usize {
    6
}

impl Default for FreSettings {
    fn default() -> Self {
        FreSettings {
            max_frontier: default_max_frontier(),
            pivot_fraction: default_pivot_fraction(),
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bm25Settings {
    #[serde(default = "default_k1")]
    pub k1: f32,
    #[serde(default = "default_b")]
    pub b: f32,
}

fn default_k1() -> f32 {
    1.2
}
fn default_b() -> f32 {
    0.75
}

impl Default for Bm25Settings {
    fn default() -> Self {
        Bm25Settings {
            k1: default_k1(),
            b: default_b(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HybridSettings {
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default = "default_beta")]
    pub beta: f32,
    #[serde(default = "default_gamma")]
    pub gamma: f32,
}

fn default_alpha() -> f32 {
    0.4
}
fn default_beta() -> f32 {
    0.4
}
fn default_gamma() -> f32 {
    0.2
}

impl Default for HybridSettings {
    fn default() -> Self {
        HybridSettings {
            alpha: default_alpha(),
            beta: default_beta(),
            gamma: default_gamma(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_cache_ttl_ms() -> u64 {
    5000
}
fn default_cache_capacity() -> usize {
    1000
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            ttl_ms: default_cache_ttl_ms(),
            capacity: default_cache_capacity(),
        }
    }
}

/// Top-level engine configuration. Every field defaults per the recognized
/// option table; construct with `Config::default()` and override only what
/// differs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub hnsw: HnswSettings,
    #[serde(default)]
    pub fre: FreSettings,
    #[serde(default)]
    pub bm25: Bm25Settings,
    #[serde(default)]
    pub hybrid: HybridSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.hnsw.m, 16);
        assert_eq!(config.hnsw.ef_construction, 200);
        assert_eq!(config.fre.max_frontier, 2000);
        assert_eq!(config.bm25.k1, 1.2);
        assert_eq!(config.hybrid.alpha, 0.4);
        assert_eq!(config.cache.ttl_ms, 5000);
    }

    #[test]
    fn deserializes_from_partial_json() {
        let config: Config = serde_json::from_str(r#"{"hnsw": {"m": 32}}"#).unwrap();
        assert_eq!(config.hnsw.m, 32);
        assert_eq!(config.hnsw.ef_construction, 200);
        assert_eq!(config.cache.capacity, 1000);
    }
}
