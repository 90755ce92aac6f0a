//! FRE graph engine: a typed-edge knowledge graph with a bounded-frontier
//! multi-source traversal primitive.
//!
//! [`KnowledgeGraph`] owns the directed labeled multigraph; traversal
//! behavior (frontier cap, pivot retention, scoring weights) is controlled
//! by [`FreConfig`] passed into [`KnowledgeGraph::dependencies`] and
//! [`KnowledgeGraph::impact`].

pub mod error;
pub mod graph;
pub mod types;

pub use error::{GraphError, GraphResult};
pub use graph::KnowledgeGraph;
pub use types::{Direction, EdgeView, FreConfig, ImpactReport, TraversalHit};
