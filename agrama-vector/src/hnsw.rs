//! Hierarchical Navigable Small World index.
//!
//! Built from scratch, grounded on the insert/search structure of a
//! from-scratch HNSW backend: a multi-layer graph where layer 0 holds every
//! node at up to `2M` connections and higher layers hold a shrinking subset
//! at up to `M` connections, with deterministic level assignment via a
//! seeded splitmix64 PRNG so identical insert sequences reproduce identical
//! graphs.
//!
//! Neighbor selection uses a diversity heuristic: a candidate is kept only
//! if it is closer to the query than to every already-selected neighbor,
//! rather than a plain "closest-M" cut. This is the one place this module's
//! algorithm differs from the simpler reference it was grounded on.

use crate::backend::VectorIndexBackend;
use crate::distance::cosine_similarity;
use crate::types::{HnswConfig, NodeId, VectorMatch};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

#[derive(Debug, Clone, PartialEq)]
struct Scored {
    score: f32,
    id: NodeId,
}

impl Eq for Scored {}
impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.id.cmp(&self.id))
    }
}

struct Node {
    neighbors: Vec<BTreeSet<NodeId>>,
    max_layer: usize,
}

impl Node {
    fn new(max_layer: usize) -> Self {
        Node {
            neighbors: (0..=max_layer).map(|_| BTreeSet::new()).collect(),
        }
    }
}

/// A single-dimension HNSW graph over dense embeddings of a fixed
/// dimension. Does not itself implement the Matryoshka fast path — see
/// [`crate::store::SemanticIndex`] for the shadow-index composition.
pub struct HnswIndex {
    config: HnswConfig,
    dim: usize,
    nodes: BTreeMap<NodeId, Node>,
    embeddings: BTreeMap<NodeId, Vec<f32>>,
    entry_point: Option<NodeId>,
    max_level: usize,
    rng_seed: u64,
    rng_counter: u64,
}

impl HnswIndex {
    pub fn new(dim: usize, config: HnswConfig) -> Self {
        HnswIndex {
            config,
            dim,
            nodes: BTreeMap::new(),
            embeddings: BTreeMap::new(),
            entry_point: None,
            max_level: 0,
            rng_seed: 42,
            rng_counter: 0,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&[f32]> {
        self.embeddings.get(&id).map(|v| v.as_slice())
    }

    fn splitmix64(&self, mut x: u64) -> u64 {
        x = x.wrapping_add(0x9e3779b97f4a7c15);
        x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
        x ^ (x >> 31)
    }

    /// Assign a level by sampling `floor(-ln(U) * mL)` via a deterministic
    /// seeded PRNG.
    fn assign_level(&mut self) -> usize {
        self.rng_counter += 1;
        let hash = self.splitmix64(self.rng_seed.wrapping_add(self.rng_counter));
        let uniform = ((hash as f64) / (u64::MAX as f64)).max(1e-15);
        (-uniform.ln() * self.config.ml) as usize
    }

    fn search_layer(&self, query: &[f32], entry_id: NodeId, ef: usize, layer: usize) -> Vec<Scored> {
        let Some(entry_emb) = self.embeddings.get(&entry_id) else {
            return Vec::new();
        };
        let entry_score = cosine_similarity(query, entry_emb);

        let mut visited = BTreeSet::new();
        visited.insert(entry_id);

        let mut candidates = BinaryHeap::new();
        candidates.push(Scored {
            score: entry_score,
            id: entry_id,
        });

        let mut results: BinaryHeap<std::cmp::Reverse<Scored>> = BinaryHeap::new();
        results.push(std::cmp::Reverse(Scored {
            score: entry_score,
            id: entry_id,
        }));

        while let Some(nearest) = candidates.pop() {
            let worst = results
                .peek()
                .map(|r| r.0.score)
                .unwrap_or(f32::NEG_INFINITY);
            if nearest.score < worst && results.len() >= ef {
                break;
            }

            if let Some(node) = self.nodes.get(&nearest.id) {
                if layer < node.neighbors.len() {
                    for &neighbor_id in &node.neighbors[layer] {
                        if !visited.insert(neighbor_id) {
                            continue;
                        }
                        let Some(neighbor_emb) = self.embeddings.get(&neighbor_id) else {
                            continue;
                        };
                        let score = cosine_similarity(query, neighbor_emb);
                        let worst = results
                            .peek()
                            .map(|r| r.0.score)
                            .unwrap_or(f32::NEG_INFINITY);
                        if results.len() < ef || score > worst {
                            candidates.push(Scored {
                                score,
                                id: neighbor_id,
                            });
                            results.push(std::cmp::Reverse(Scored {
                                score,
                                id: neighbor_id,
                            }));
                            if results.len() > ef {
                                results.pop();
                            }
                        }
                    }
                }
            }
        }

        let mut out: Vec<Scored> = results.into_iter().map(|r| r.0).collect();
        out.sort();
        out.reverse();
        out
    }

    fn greedy_descend(&self, query: &[f32], entry_id: NodeId, from_layer: usize, to_layer: usize) -> NodeId {
        let mut current = entry_id;
        for layer in (to_layer..=from_layer).rev() {
            loop {
                let Some(current_emb) = self.embeddings.get(&current) else {
                    break;
                };
                let mut best_score = cosine_similarity(query, current_emb);
                let mut best_id = current;
                if let Some(node) = self.nodes.get(&current) {
                    if layer < node.neighbors.len() {
                        for &neighbor_id in &node.neighbors[layer] {
                            if let Some(neighbor_emb) = self.embeddings.get(&neighbor_id) {
                                let score = cosine_similarity(query, neighbor_emb);
                                if score > best_score || (score == best_score && neighbor_id < best_id) {
                                    best_score = score;
                                    best_id = neighbor_id;
                                }
                            }
                        }
                    }
                }
                if best_id == current {
                    break;
                }
                current = best_id;
            }
        }
        current
    }

    /// Diversity-preferring neighbor selection: a candidate is kept only if
    /// it is closer to the query than to every already-selected neighbor,
    /// capped at `max_connections`.
    fn select_neighbors_diverse(&self, query_id: NodeId, candidates: &[Scored], max_connections: usize) -> Vec<NodeId> {
        let mut selected: Vec<Scored> = Vec::new();
        for candidate in candidates {
            if selected.len() >= max_connections {
                break;
            }
            let Some(candidate_emb) = self.embeddings.get(&candidate.id) else {
                continue;
            };
            let mut keep = true;
            for chosen in &selected {
                let Some(chosen_emb) = self.embeddings.get(&chosen.id) else {
                    continue;
                };
                let dist_to_chosen = 1.0 - cosine_similarity(candidate_emb, chosen_emb);
                let dist_to_query = 1.0 - candidate.score;
                if dist_to_chosen < dist_to_query {
                    keep = false;
                    break;
                }
            }
            if keep {
                selected.push(candidate.clone());
            }
        }
        // Fall back to closest-first if diversity filtering is overly
        // aggressive and under-fills the connection budget.
        if selected.len() < max_connections.min(candidates.len()) {
            let chosen_ids: BTreeSet<NodeId> = selected.iter().map(|s| s.id).collect();
            for candidate in candidates {
                if selected.len() >= max_connections {
                    break;
                }
                if !chosen_ids.contains(&candidate.id) {
                    selected.push(candidate.clone());
                }
            }
        }
        let _ = query_id;
        selected.into_iter().map(|s| s.id).collect()
    }

    fn prune_neighbors(&mut self, id: NodeId, layer: usize, max_connections: usize) {
        let Some(embedding) = self.embeddings.get(&id).cloned() else {
            return;
        };
        let neighbor_ids: Vec<NodeId> = match self.nodes.get(&id) {
            Some(node) if layer < node.neighbors.len() => node.neighbors[layer].iter().copied().collect(),
            _ => return,
        };
        let mut scored: Vec<Scored> = neighbor_ids
            .iter()
            .filter_map(|&nid| {
                self.embeddings
                    .get(&nid)
                    .map(|e| Scored {
                        score: cosine_similarity(&embedding, e),
                        id: nid,
                    })
            })
            .collect();
        scored.sort();
        scored.reverse();
        let kept = self.select_neighbors_diverse(id, &scored, max_connections);
        if let Some(node) = self.nodes.get_mut(&id) {
            if layer < node.neighbors.len() {
                node.neighbors[layer] = kept.into_iter().collect();
            }
        }
    }

    /// Insert `embedding` under `id`.
    pub fn insert(&mut self, id: NodeId, embedding: Vec<f32>) {
        let level = self.assign_level();
        self.embeddings.insert(id, embedding.clone());
        self.nodes.insert(id, Node::new(level));

        let Some(entry_id) = self.entry_point else {
            self.entry_point = Some(id);
            self.max_level = level;
            return;
        };

        let mut current_entry = entry_id;
        if self.max_level > level {
            current_entry = self.greedy_descend(&embedding, entry_id, self.max_level, level + 1);
        }

        let start_layer = level.min(self.max_level);
        for layer in (0..=start_layer).rev() {
            let candidates = self.search_layer(&embedding, current_entry, self.config.ef_construction, layer);
            let max_conn = if layer == 0 {
                self.config.max_connections_layer0()
            } else {
                self.config.max_connections()
            };
            let selected = self.select_neighbors_diverse(id, &candidates, max_conn);

            if let Some(node) = self.nodes.get_mut(&id) {
                if layer < node.neighbors.len() {
                    for &n in &selected {
                        node.neighbors[layer].insert(n);
                    }
                }
            }

            for &neighbor_id in &selected {
                let needs_prune = if let Some(neighbor_node) = self.nodes.get_mut(&neighbor_id) {
                    if layer < neighbor_node.neighbors.len() {
                        neighbor_node.neighbors[layer].insert(id);
                        neighbor_node.neighbors[layer].len() > max_conn
                    } else {
                        false
                    }
                } else {
                    false
                };
                if needs_prune {
                    self.prune_neighbors(neighbor_id, layer, max_conn);
                }
            }

            if let Some(closest) = candidates.first() {
                current_entry = closest.id;
            }
        }

        if level > self.max_level {
            self.entry_point = Some(id);
            self.max_level = level;
        }
    }

    /// Approximate k-nearest-neighbor query.
    pub fn search(&self, query: &[f32], k: usize, ef_search: usize) -> Vec<(NodeId, f32)> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }
        let Some(entry_id) = self.entry_point else {
            return Vec::new();
        };
        let entry = self.greedy_descend(query, entry_id, self.max_level, 1);
        let ef = ef_search.max(k);
        let mut results = self.search_layer(query, entry, ef, 0);
        results.truncate(k);
        results.into_iter().map(|s| (s.id, s.score)).collect()
    }
}

impl VectorIndexBackend for HnswIndex {
    fn insert(&mut self, id: NodeId, embedding: Vec<f32>) {
        HnswIndex::insert(self, id, embedding)
    }

    /// Uses this index's own configured `ef_search` as the query-time beam
    /// width, since the trait has no per-call knob for it.
    fn search(&self, query: &[f32], k: usize) -> Vec<(NodeId, f32)> {
        HnswIndex::search(self, query, k, self.config.ef_search)
    }

    fn len(&self) -> usize {
        HnswIndex::len(self)
    }

    fn is_empty(&self) -> bool {
        HnswIndex::is_empty(self)
    }

    fn get(&self, id: NodeId) -> Option<&[f32]> {
        HnswIndex::get(self, id)
    }
}
