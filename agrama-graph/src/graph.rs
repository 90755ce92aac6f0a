//! Typed-edge knowledge graph with frontier-reduced traversal.
//!
//! Built on `petgraph::stable_graph::StableDiGraph` under one
//! `parking_lot::RwLock`: writers (`add_edge`) take the lock exclusively,
//! readers (`neighbors`, `dependencies`, `impact`) share it, matching the
//! readers-writer discipline used for every other shared structure in this
//! substrate.

use crate::error::{GraphError, GraphResult};
use crate::types::{Direction, EdgeView, FreConfig, ImpactReport, TraversalHit};
use agrama_core::Json;
use parking_lot::RwLock;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction as PgDirection;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone)]
struct EdgeData {
    relation: String,
    metadata: Option<Json>,
}

struct Inner {
    graph: StableDiGraph<String, EdgeData>,
    index: HashMap<String, NodeIndex>,
}

impl Inner {
    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    fn find_edge(&self, from: NodeIndex, to: NodeIndex, relation: &str) -> Option<EdgeIndex> {
        self.graph
            .edges_connecting(from, to)
            .find(|e| e.weight().relation == relation)
            .map(|e| e.id())
    }
}

/// One candidate in a frontier being expanded during traversal.
struct FrontierEntry {
    idx: NodeIndex,
    distance: u32,
    path: Vec<String>,
    parent: NodeIndex,
}

pub struct KnowledgeGraph {
    inner: RwLock<Inner>,
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        KnowledgeGraph {
            inner: RwLock::new(Inner {
                graph: StableDiGraph::new(),
                index: HashMap::new(),
            }),
        }
    }

    pub fn node_count(&self) -> usize {
        self.inner.read().graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.read().graph.edge_count()
    }

    /// Add (or, if `(from, to, relation)` already exists, update) an edge.
    /// Idempotent on the triple; a repeat call replaces metadata wholesale.
    #[tracing::instrument(skip(self, metadata), fields(from = %from, to = %to, relation = %relation))]
    pub fn add_edge(&self, from: &str, to: &str, relation: &str, metadata: Option<Json>) -> GraphResult<()> {
        if from.is_empty() || to.is_empty() {
            return Err(GraphError::EmptyEndpoint);
        }
        if relation.is_empty() {
            return Err(GraphError::EmptyRelation);
        }

        let mut inner = self.inner.write();
        let from_idx = inner.ensure_node(from);
        let to_idx = inner.ensure_node(to);

        if let Some(edge_idx) = inner.find_edge(from_idx, to_idx, relation) {
            if let Some(weight) = inner.graph.edge_weight_mut(edge_idx) {
                weight.metadata = metadata;
            }
        } else {
            inner.graph.add_edge(
                from_idx,
                to_idx,
                EdgeData {
                    relation: relation.to_string(),
                    metadata,
                },
            );
        }
        Ok(())
    }

    /// Edges touching `node`, filtered by direction and optionally by
    /// relation.
    pub fn neighbors(&self, node: &str, direction: Direction, relation_filter: Option<&str>) -> Vec<EdgeView> {
        let inner = self.inner.read();
        let Some(&idx) = inner.index.get(node) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        if matches!(direction, Direction::Out | Direction::Both) {
            for edge in inner.graph.edges_directed(idx, PgDirection::Outgoing) {
                let data = edge.weight();
                if relation_filter.is_some_and(|r| r != data.relation) {
                    continue;
                }
                out.push(EdgeView {
                    from: node.to_string(),
                    to: inner.graph[edge.target()].clone(),
                    relation: data.relation.clone(),
                    metadata: data.metadata.clone(),
                });
            }
        }
        if matches!(direction, Direction::In | Direction::Both) {
            for edge in inner.graph.edges_directed(idx, PgDirection::Incoming) {
                let data = edge.weight();
                if relation_filter.is_some_and(|r| r != data.relation) {
                    continue;
                }
                out.push(EdgeView {
                    from: inner.graph[edge.source()].clone(),
                    to: node.to_string(),
                    relation: data.relation.clone(),
                    metadata: data.metadata.clone(),
                });
            }
        }
        out.sort_by(|a, b| (&a.to, &a.relation).cmp(&(&b.to, &b.relation)));
        out
    }

    fn pg_directions(direction: Direction) -> Vec<PgDirection> {
        match direction {
            Direction::Out => vec![PgDirection::Outgoing],
            Direction::In => vec![PgDirection::Incoming],
            Direction::Both => vec![PgDirection::Outgoing, PgDirection::Incoming],
        }
    }

    /// Frontier-reduced, depth-bounded traversal from `start`. Returns an
    /// empty sequence (not an error) when `start` is not a known node.
    #[tracing::instrument(skip(self, config), fields(start = %start, max_depth))]
    pub fn dependencies(
        &self,
        start: &str,
        max_depth: usize,
        direction: Direction,
        config: &FreConfig,
    ) -> GraphResult<Vec<TraversalHit>> {
        if start.is_empty() {
            return Err(GraphError::EmptyEndpoint);
        }
        let (hits, _) = self.traverse(start, max_depth, direction, config);
        Ok(hits)
    }

    /// Transitive reverse neighborhood of `target` up to `max_depth`,
    /// annotated with how often each relation occurred along traversed
    /// edges.
    #[tracing::instrument(skip(self, config), fields(target = %target, max_depth))]
    pub fn impact(&self, target: &str, max_depth: usize, config: &FreConfig) -> GraphResult<ImpactReport> {
        if target.is_empty() {
            return Err(GraphError::EmptyEndpoint);
        }
        let (nodes, relation_counts) = self.traverse(target, max_depth, Direction::In, config);
        Ok(ImpactReport {
            nodes,
            relation_counts,
        })
    }

    fn traverse(
        &self,
        start: &str,
        max_depth: usize,
        direction: Direction,
        config: &FreConfig,
    ) -> (Vec<TraversalHit>, BTreeMap<String, u32>) {
        let inner = self.inner.read();
        let mut relation_counts: BTreeMap<String, u32> = BTreeMap::new();
        let Some(&start_idx) = inner.index.get(start) else {
            return (Vec::new(), relation_counts);
        };

        let directions = Self::pg_directions(direction);
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        visited.insert(start_idx);

        let mut current: Vec<FrontierEntry> = vec![FrontierEntry {
            idx: start_idx,
            distance: 0,
            path: vec![start.to_string()],
            parent: start_idx,
        }];
        let mut results: Vec<TraversalHit> = Vec::new();

        for depth in 1..=max_depth {
            let mut candidates: BTreeMap<String, FrontierEntry> = BTreeMap::new();
            for entry in &current {
                for &dir in &directions {
                    for edge in inner.graph.edges_directed(entry.idx, dir) {
                        let (neighbor_idx, relation) = match dir {
                            PgDirection::Outgoing => (edge.target(), edge.weight().relation.clone()),
                            PgDirection::Incoming => (edge.source(), edge.weight().relation.clone()),
                        };
                        if visited.contains(&neighbor_idx) {
                            continue;
                        }
                        let neighbor_id = inner.graph[neighbor_idx].clone();
                        *relation_counts.entry(relation).or_insert(0) += 1;
                        candidates.entry(neighbor_id.clone()).or_insert_with(|| {
                            let mut path = entry.path.clone();
                            path.push(neighbor_id);
                            FrontierEntry {
                                idx: neighbor_idx,
                                distance: depth as u32,
                                path,
                                parent: entry.idx,
                            }
                        });
                    }
                }
            }

            if candidates.is_empty() {
                break;
            }

            let mut next: Vec<FrontierEntry> = candidates.into_values().collect();
            if next.len() > config.max_frontier {
                next = self.select_pivots(&inner.graph, next, config);
            }
            next.sort_by(|a, b| inner.graph[a.idx].cmp(&inner.graph[b.idx]));

            for entry in &next {
                visited.insert(entry.idx);
                results.push(TraversalHit {
                    node: inner.graph[entry.idx].clone(),
                    distance: entry.distance,
                    path: entry.path.clone(),
                });
            }
            current = next;
        }

        results.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.node.cmp(&b.node)));
        (results, relation_counts)
    }

    /// Reduce an over-large frontier to a pivot set: the top entries by a
    /// score combining distance (closer is better), in-degree (more
    /// connected is more promising), and path diversity (entries that don't
    /// share a parent with many siblings are preferred), per
    /// `config`'s weights and `pivot_fraction`.
    fn select_pivots(
        &self,
        graph: &StableDiGraph<String, EdgeData>,
        candidates: Vec<FrontierEntry>,
        config: &FreConfig,
    ) -> Vec<FrontierEntry> {
        let mut parent_counts: HashMap<NodeIndex, usize> = HashMap::new();
        for c in &candidates {
            *parent_counts.entry(c.parent).or_insert(0) += 1;
        }

        let max_distance = candidates.iter().map(|c| c.distance).max().unwrap_or(1).max(1) as f64;
        let max_in_degree = candidates
            .iter()
            .map(|c| graph.edges_directed(c.idx, PgDirection::Incoming).count())
            .max()
            .unwrap_or(1)
            .max(1) as f64;

        let mut scored: Vec<(f64, FrontierEntry)> = candidates
            .into_iter()
            .map(|c| {
                let in_degree = graph.edges_directed(c.idx, PgDirection::Incoming).count() as f64;
                let siblings = *parent_counts.get(&c.parent).unwrap_or(&1) as f64;
                let distance_score = 1.0 - (c.distance as f64 / max_distance);
                let in_degree_score = in_degree / max_in_degree;
                let diversity_score = 1.0 / siblings;
                let score = config.distance_weight * distance_score
                    + config.in_degree_weight * in_degree_score
                    + config.diversity_weight * diversity_score;
                (score, c)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| graph[a.1.idx].cmp(&graph[b.1.idx]))
        });

        let pivot_count = ((scored.len() as f64 * config.pivot_fraction).ceil() as usize)
            .max(1)
            .min(scored.len());
        scored.truncate(pivot_count);
        scored.into_iter().map(|(_, entry)| entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_edge_then_neighbors_round_trips() {
        let g = KnowledgeGraph::new();
        g.add_edge("a", "b", "depends_on", None).unwrap();
        let out = g.neighbors("a", Direction::Out, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, "b");
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let g = KnowledgeGraph::new();
        assert_eq!(g.add_edge("", "b", "r", None).unwrap_err(), GraphError::EmptyEndpoint);
    }

    #[test]
    fn empty_relation_is_rejected() {
        let g = KnowledgeGraph::new();
        assert_eq!(g.add_edge("a", "b", "", None).unwrap_err(), GraphError::EmptyRelation);
    }

    #[test]
    fn repeat_add_edge_is_idempotent_on_triple() {
        let g = KnowledgeGraph::new();
        g.add_edge("a", "b", "r", None).unwrap();
        g.add_edge("a", "b", "r", Some(Json::object())).unwrap();
        assert_eq!(g.edge_count(), 1);
        let out = g.neighbors("a", Direction::Out, None);
        assert_eq!(out[0].metadata, Some(Json::object()));
    }

    #[test]
    fn parallel_edges_with_distinct_relations_both_survive() {
        let g = KnowledgeGraph::new();
        g.add_edge("a", "b", "r1", None).unwrap();
        g.add_edge("a", "b", "r2", None).unwrap();
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn dependencies_from_unknown_node_is_empty_not_error() {
        let g = KnowledgeGraph::new();
        let hits = g.dependencies("nope", 3, Direction::Out, &FreConfig::default()).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn dependencies_respects_max_depth() {
        let g = KnowledgeGraph::new();
        g.add_edge("a", "b", "r", None).unwrap();
        g.add_edge("b", "c", "r", None).unwrap();
        g.add_edge("c", "d", "r", None).unwrap();
        let hits = g.dependencies("a", 2, Direction::Out, &FreConfig::default()).unwrap();
        assert!(hits.iter().any(|h| h.node == "c"));
        assert!(!hits.iter().any(|h| h.node == "d"));
    }

    #[test]
    fn dependencies_distances_are_hop_counts() {
        let g = KnowledgeGraph::new();
        g.add_edge("a", "b", "r", None).unwrap();
        g.add_edge("b", "c", "r", None).unwrap();
        let hits = g.dependencies("a", 5, Direction::Out, &FreConfig::default()).unwrap();
        let c = hits.iter().find(|h| h.node == "c").unwrap();
        assert_eq!(c.distance, 2);
        assert_eq!(c.path, vec!["a", "b", "c"]);
    }

    #[test]
    fn frontier_cap_prunes_to_pivot_fraction() {
        let g = KnowledgeGraph::new();
        for i in 0..100 {
            g.add_edge("root", &format!("n{i}"), "r", None).unwrap();
        }
        let config = FreConfig {
            max_frontier: 10,
            pivot_fraction: 0.2,
            ..FreConfig::default()
        };
        let hits = g.dependencies("root", 1, Direction::Out, &config).unwrap();
        assert_eq!(hits.len(), 20);
    }

    #[test]
    fn impact_analysis_counts_relations() {
        let g = KnowledgeGraph::new();
        g.add_edge("a", "target", "calls", None).unwrap();
        g.add_edge("b", "target", "calls", None).unwrap();
        g.add_edge("c", "target", "imports", None).unwrap();
        let report = g.impact("target", 2, &FreConfig::default()).unwrap();
        assert_eq!(report.nodes.len(), 3);
        assert_eq!(report.relation_counts.get("calls"), Some(&2));
        assert_eq!(report.relation_counts.get("imports"), Some(&1));
    }

    #[test]
    fn self_loops_are_allowed() {
        let g = KnowledgeGraph::new();
        g.add_edge("a", "a", "self", None).unwrap();
        assert_eq!(g.edge_count(), 1);
    }
}
