//! # Agrama
//!
//! A multi-agent temporal knowledge substrate, exposed to language-model
//! agents through five composable primitives.
//!
//! Agents concurrently read, write, search, and relate arbitrary content
//! across a shared store. The substrate maintains causal history, a
//! semantic vector index, a typed knowledge graph, and a lexical index, and
//! fuses all three retrieval modes into a single ranked query.
//!
//! # Quick Start
//!
//! ```no_run
//! use agrama::{AgentId, Config, Engine, Json};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! fn main() {
//!     let embed = Arc::new(|_text: &str| vec![0.0f32; 768]);
//!     let engine = Engine::new(Config::default(), embed);
//!     let agent = AgentId::new("agent-1");
//!
//!     engine
//!         .dispatch("store", Json(json!({"key": "doc1", "value": "hello"})), agent.clone(), None)
//!         .unwrap();
//!     let result = engine
//!         .dispatch("retrieve", Json(json!({"key": "doc1"})), agent, None)
//!         .unwrap();
//!     assert_eq!(result.0["value"], "hello");
//! }
//! ```
//!
//! # Primitives
//!
//! | Primitive   | Purpose                                      |
//! |-------------|-----------------------------------------------|
//! | `store`     | Write a keyed value and fan out to the indexes |
//! | `retrieve`  | Read a key's current value, metadata, history  |
//! | `search`    | Lexical, semantic, or fused hybrid query       |
//! | `link`      | Add a typed edge between two keys              |
//! | `transform` | Pure text transforms (no store side effects)   |
//!
//! # Architecture
//!
//! [`Engine`] is the single entry point: one temporal store, one BM25
//! lexical index, one HNSW semantic index, one knowledge graph, and the
//! hybrid fusion layer, all wired together and dispatched through
//! [`Engine::dispatch`]. The component crates (`agrama-store`,
//! `agrama-lexical`, `agrama-vector`, `agrama-graph`, `agrama-hybrid`) are
//! not re-exported in full; only the stable surface below is.

pub use agrama_core::{AgentId, AgramaError, Json, Limits, Result, Timestamp, ValidationRule, Version};
pub use agrama_engine::{Config, EmbedFn, Engine, Fingerprint, ResponseCache, SessionState, SessionTable, PRIMITIVES};
pub use agrama_graph::{Direction, EdgeView, FreConfig, ImpactReport, TraversalHit};
