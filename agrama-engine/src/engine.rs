//! The primitive dispatcher: validates, routes to one or more components,
//! updates session bookkeeping, and answers through the response cache.
//!
//! Validate → arena-scope → route → update session counters → return a
//! typed result. A typed `Command` enum isn't needed here since the five
//! primitives already arrive as a name plus a JSON argument tree.

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::fingerprint::Fingerprint;
use crate::session::SessionTable;
use crate::transform;
use agrama_core::error::{AgramaError, Result, ValidationRule};
use agrama_core::types::{AgentId, Timestamp};
use agrama_core::Json;
use agrama_graph::{Direction, FreConfig, ImpactReport, KnowledgeGraph, TraversalHit};
use agrama_hybrid::{EmbedFn, HybridSearch, Weights};
use agrama_lexical::BM25Index;
use agrama_store::TemporalStore;
use agrama_vector::{HnswConfig, SemanticIndex};
use bumpalo::Bump;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const PRIMITIVES: &[&str] = &["store", "retrieve", "search", "link", "transform"];

/// A fully wired Agrama substrate: one store, one of each index, one
/// dispatcher. Construct once and thread through every call — no
/// module-level globals.
pub struct Engine {
    store: TemporalStore,
    lexical: Arc<BM25Index>,
    semantic: Arc<RwLock<SemanticIndex>>,
    graph: Arc<KnowledgeGraph>,
    hybrid: HybridSearch,
    sessions: SessionTable,
    cache: ResponseCache,
    config: Config,
    embed: EmbedFn,
}

/// Threshold reported through the `store` result's `indexed` field. Every
/// stored value is fanned out to the lexical and semantic indexes
/// regardless of size — short values still need to be searchable (see the
/// camelCase tokenization and three-record lexical scenarios) — so this
/// constant is informational only, not a gate on indexing.
const INDEX_THRESHOLD_BYTES: usize = 50;

impl Engine {
    pub fn new(config: Config, embed: EmbedFn) -> Self {
        let hnsw_config = HnswConfig {
            m: config.hnsw.m,
            ef_construction: config.hnsw.ef_construction,
            ef_search: config.hnsw.ef_search,
            ml: 1.0 / (config.hnsw.m as f64).ln(),
            matryoshka_dims: config.hnsw.matryoshka_dims.clone(),
        };

        let lexical = Arc::new(BM25Index::new(config.bm25.k1, config.bm25.b));
        let semantic = Arc::new(RwLock::new(SemanticIndex::new(hnsw_config, config.hnsw.dim)));
        let graph = Arc::new(KnowledgeGraph::new());
        let hybrid = HybridSearch::new(lexical.clone(), semantic.clone(), graph.clone(), embed.clone());
        let cache = ResponseCache::new(config.cache.ttl_ms, config.cache.capacity);

        Engine {
            store: TemporalStore::default(),
            lexical,
            semantic,
            graph,
            hybrid,
            sessions: SessionTable::new(),
            cache,
            config,
            embed,
        }
    }

    fn fre_config(&self) -> FreConfig {
        FreConfig {
            max_frontier: self.config.fre.max_frontier,
            pivot_fraction: self.config.fre.pivot_fraction,
            ..FreConfig::default()
        }
    }

    /// Dispatch one primitive call. `deadline` bounds the whole call,
    /// including any fan-out; on expiry the dispatcher stops issuing new
    /// subtasks, drops partial results, and returns `DeadlineExceeded`
    /// without ever populating the response cache.
    #[tracing::instrument(level = "debug", skip(self, arguments), fields(primitive, agent = %agent))]
    pub fn dispatch(&self, primitive: &str, arguments: Json, agent: AgentId, deadline: Option<Duration>) -> Result<Json> {
        if !PRIMITIVES.contains(&primitive) {
            tracing::warn!(primitive, "rejected unknown primitive");
            return Err(AgramaError::validation(
                ValidationRule::UnknownPrimitive,
                format!("unknown primitive: {primitive}"),
            ));
        }

        let started_at = Instant::now();
        let expires_at = deadline.map(|d| started_at + d);
        let check_deadline = |operation: &str| -> Result<()> {
            if let Some(dl) = expires_at {
                if Instant::now() >= dl {
                    tracing::warn!(operation, "dispatch deadline exceeded");
                    return Err(AgramaError::DeadlineExceeded {
                        operation: operation.to_string(),
                    });
                }
            }
            Ok(())
        };

        let is_write = matches!(primitive, "store" | "link");
        let fingerprint = Fingerprint::compute(primitive, &arguments);

        if !is_write {
            if let Some(cached) = self.cache.get(&fingerprint) {
                tracing::debug!(primitive, "response cache hit");
                self.sessions.record(&agent, primitive, now_micros());
                return Ok(cached);
            }
        }

        check_deadline("validate")?;
        let arena = Bump::new();

        let (result, referenced_key) = match primitive {
            "store" => {
                tracing::info!(primitive, "dispatching write");
                let key = self.dispatch_store(&arguments, &agent, &check_deadline)?;
                (self.store_result(&arguments)?, Some(key))
            }
            "retrieve" => {
                let (result, key) = self.dispatch_retrieve(&arguments)?;
                (result, Some(key))
            }
            "search" => (self.dispatch_search(&arguments, &check_deadline)?, None),
            "link" => {
                tracing::info!(primitive, "dispatching write");
                self.dispatch_link(&arguments)?
            }
            "transform" => (self.dispatch_transform(&arena, &arguments)?, None),
            _ => unreachable!("validated above"),
        };

        if is_write {
            if let Some(key) = &referenced_key {
                self.cache.invalidate_key(key);
            }
        } else if check_deadline("cache-populate").is_ok() {
            self.cache.put(fingerprint, result.clone(), referenced_key);
        }

        self.sessions.record(&agent, primitive, now_micros());
        Ok(result)
    }

    /// Validates `field` as a non-empty string, distinguishing "absent or
    /// empty" (reported as `empty_rule`) from "present but not a string"
    /// (always reported as [`ValidationRule::WrongType`]).
    fn require_str<'a>(&self, arguments: &'a Json, field: &str, empty_rule: ValidationRule) -> Result<&'a str> {
        match arguments.get(field) {
            None | Some(Value::Null) => Err(AgramaError::validation(
                empty_rule,
                format!("argument `{field}` must be a non-empty string"),
            )),
            Some(Value::String(s)) if s.is_empty() => Err(AgramaError::validation(
                empty_rule,
                format!("argument `{field}` must be a non-empty string"),
            )),
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(AgramaError::validation(
                ValidationRule::WrongType,
                format!("argument `{field}` must be a string"),
            )),
        }
    }

    #[allow(clippy::type_complexity)]
    fn dispatch_store(
        &self,
        arguments: &Json,
        agent: &AgentId,
        check_deadline: &dyn Fn(&str) -> Result<()>,
    ) -> Result<String> {
        let key = self.require_str(arguments, "key", ValidationRule::EmptyKey)?.to_string();
        let value = self.require_str(arguments, "value", ValidationRule::EmptyValue)?.to_string();

        self.store.put(&key, value.clone().into_bytes(), agent.clone())?;

        if let Some(metadata) = arguments.get("metadata") {
            self.store.put_meta(&key, Json(metadata.clone()))?;
        }

        check_deadline("index")?;
        self.lexical.index(&key, &value);
        let embedding = (self.embed)(&value);
        if let Err(err) = self.semantic.write().insert(&key, embedding) {
            tracing::warn!(key, error = %err, "semantic indexing failed; value is still stored and lexically indexed");
        }

        Ok(key)
    }

    fn store_result(&self, arguments: &Json) -> Result<Json> {
        let key = self.require_str(arguments, "key", ValidationRule::EmptyKey)?;
        let value_len = arguments
            .get("value")
            .and_then(Value::as_str)
            .map(str::len)
            .unwrap_or(0);
        Ok(Json(json!({
            "success": true,
            "key": key,
            "indexed": value_len >= INDEX_THRESHOLD_BYTES,
        })))
    }

    fn dispatch_retrieve(&self, arguments: &Json) -> Result<(Json, String)> {
        let key = self.require_str(arguments, "key", ValidationRule::EmptyKey)?.to_string();
        let include_history = arguments.get("include_history").and_then(Value::as_bool).unwrap_or(false);

        let Some((value, metadata)) = self.store.get(&key) else {
            return Ok((
                Json(json!({
                    "exists": false,
                    "key": key,
                })),
                key,
            ));
        };

        let mut out = json!({
            "exists": true,
            "key": key,
            "value": String::from_utf8_lossy(&value),
            "metadata": metadata.map(|m| m.0).unwrap_or(Value::Null),
        });

        if include_history {
            let history: Vec<Value> = self
                .store
                .history(&key, None)
                .into_iter()
                .map(|entry| {
                    json!({
                        "version": entry.version,
                        "timestamp": entry.timestamp,
                        "value": String::from_utf8_lossy(&entry.value),
                        "author": entry.author.as_str(),
                    })
                })
                .collect();
            out["history"] = Value::Array(history);
        }

        Ok((Json(out), key))
    }

    fn dispatch_search(&self, arguments: &Json, check_deadline: &dyn Fn(&str) -> Result<()>) -> Result<Json> {
        let query = self.require_str(arguments, "query", ValidationRule::EmptyQuery)?;
        let search_type = self.require_str(arguments, "type", ValidationRule::EmptyType)?;

        let options = arguments.get("options").cloned().unwrap_or(Value::Null);
        let max_results = options
            .get("max_results")
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .unwrap_or(10);
        let ef_search = max_results.max(self.config.hnsw.ef_search);

        check_deadline("search")?;

        let results = match search_type {
            "lexical" => {
                let hits = self.lexical.search(query, max_results);
                hits.into_iter()
                    .map(|h| json!({"doc_id": h.doc_id, "score": h.score}))
                    .collect::<Vec<_>>()
            }
            "semantic" => {
                let embedding = (self.embed)(query);
                let hits = self.semantic.read().search(&embedding, max_results, ef_search)?;
                hits.into_iter()
                    .map(|h| json!({"doc_id": h.key, "score": h.score}))
                    .collect::<Vec<_>>()
            }
            "hybrid" => {
                let alpha = options.get("alpha").and_then(Value::as_f64).unwrap_or(self.config.hybrid.alpha as f64) as f32;
                let beta = options.get("beta").and_then(Value::as_f64).unwrap_or(self.config.hybrid.beta as f64) as f32;
                let gamma = options.get("gamma").and_then(Value::as_f64).unwrap_or(self.config.hybrid.gamma as f64) as f32;
                let weights = Weights::new(alpha, beta, gamma).map_err(|err| {
                    AgramaError::validation(ValidationRule::WeightsDoNotSumToOne, err.to_string())
                })?;
                let response = self.hybrid.search(query, weights, max_results, ef_search)?;
                response
                    .hits
                    .into_iter()
                    .map(|h| {
                        json!({
                            "doc_id": h.doc_id,
                            "score": h.score,
                            "lexical_score": h.lexical_score,
                            "semantic_score": h.semantic_score,
                            "graph_score": h.graph_score,
                        })
                    })
                    .collect::<Vec<_>>()
            }
            other => {
                return Err(AgramaError::validation(
                    ValidationRule::UnknownSearchType,
                    format!("unknown search type: {other}"),
                ));
            }
        };

        let count = results.len();
        Ok(Json(json!({
            "query": query,
            "type": search_type,
            "results": results,
            "count": count,
        })))
    }

    fn dispatch_link(&self, arguments: &Json) -> Result<(Json, Option<String>)> {
        let from = self.require_str(arguments, "from", ValidationRule::EmptyFrom)?.to_string();
        let to = self.require_str(arguments, "to", ValidationRule::EmptyTo)?.to_string();
        let relation = self.require_str(arguments, "relation", ValidationRule::EmptyRelation)?.to_string();
        let metadata = arguments.get("metadata").map(|m| Json(m.clone()));

        self.graph.add_edge(&from, &to, &relation, metadata)?;

        // Both endpoints may themselves be record keys; invalidate both
        // directly rather than trying to express two keys as one
        // `referenced_key`.
        self.cache.invalidate_key(&from);
        self.cache.invalidate_key(&to);

        let timestamp = now_micros();
        let result = Json(json!({
            "success": true,
            "from": from,
            "to": to,
            "relation": relation,
            "timestamp": timestamp,
        }));
        Ok((result, None))
    }

    fn dispatch_transform(&self, arena: &Bump, arguments: &Json) -> Result<Json> {
        let operation = self.require_str(arguments, "operation", ValidationRule::UnknownOperation)?;
        let data = arguments.get("data").and_then(Value::as_str).unwrap_or("");
        let options = arguments.get("options").cloned().unwrap_or_else(|| json!({}));

        let output = transform::run(arena, operation, data, &options)?;
        Ok(Json(json!({
            "success": true,
            "operation": operation,
            "input_size": data.len(),
            "output_size": output.len(),
            "output": output,
        })))
    }

    /// Read-only access for callers that want direct component views (e.g.
    /// `neighbors` graph queries outside the five named primitives).
    pub fn graph(&self) -> &Arc<KnowledgeGraph> {
        &self.graph
    }

    /// Frontier-reduced forward traversal from `start`, outside the five
    /// named primitives. `max_depth` defaults to `config.fre.max_depth`
    /// when not given explicitly.
    pub fn dependencies(&self, start: &str, direction: Direction, max_depth: Option<usize>) -> Result<Vec<TraversalHit>> {
        let depth = max_depth.unwrap_or(self.config.fre.max_depth);
        Ok(self.graph.dependencies(start, depth, direction, &self.fre_config())?)
    }

    /// Transitive reverse-neighborhood impact analysis for `target`, outside
    /// the five named primitives. `max_depth` defaults to
    /// `config.fre.max_depth` when not given explicitly.
    pub fn impact(&self, target: &str, max_depth: Option<usize>) -> Result<ImpactReport> {
        let depth = max_depth.unwrap_or(self.config.fre.max_depth);
        Ok(self.graph.impact(target, depth, &self.fre_config())?)
    }

    pub fn fre_config_for_tests(&self) -> FreConfig {
        self.fre_config()
    }
}

fn now_micros() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_embed() -> EmbedFn {
        Arc::new(|text: &str| {
            let mut v = vec![0.0f32; 8];
            for (i, byte) in text.bytes().enumerate() {
                v[i % 8] += byte as f32;
            }
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for x in v.iter_mut() {
                    *x /= norm;
                }
            }
            v
        })
    }

    fn engine() -> Engine {
        let mut config = Config::default();
        config.hnsw.dim = 8;
        config.hnsw.matryoshka_dims = vec![8];
        Engine::new(config, test_embed())
    }

    fn agent() -> AgentId {
        AgentId::new("agent-1")
    }

    #[test]
    fn unknown_primitive_is_rejected() {
        let e = engine();
        let err = e.dispatch("delete", Json(json!({})), agent(), None).unwrap_err();
        assert!(matches!(err, AgramaError::Validation { rule: ValidationRule::UnknownPrimitive, .. }));
    }

    #[test]
    fn store_then_retrieve_round_trips() {
        let e = engine();
        e.dispatch("store", Json(json!({"key": "doc1", "value": "Authentication uses bcrypt"})), agent(), None).unwrap();
        let result = e.dispatch("retrieve", Json(json!({"key": "doc1"})), agent(), None).unwrap();
        assert_eq!(result.0["exists"], true);
        assert_eq!(result.0["value"], "Authentication uses bcrypt");
    }

    #[test]
    fn retrieve_unknown_key_is_not_an_error() {
        let e = engine();
        let result = e.dispatch("retrieve", Json(json!({"key": "ghost"})), agent(), None).unwrap();
        assert_eq!(result.0["exists"], false);
    }

    #[test]
    fn retrieve_with_history_orders_newest_first() {
        let e = engine();
        for v in ["v1", "v2", "v3"] {
            e.dispatch("store", Json(json!({"key": "k", "value": v})), agent(), None).unwrap();
        }
        let result = e
            .dispatch("retrieve", Json(json!({"key": "k", "include_history": true})), agent(), None)
            .unwrap();
        let values: Vec<String> = result.0["history"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["value"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(values, vec!["v3", "v2", "v1"]);
    }

    #[test]
    fn search_without_type_is_rejected() {
        let e = engine();
        let err = e.dispatch("search", Json(json!({"query": "x"})), agent(), None).unwrap_err();
        assert!(matches!(err, AgramaError::Validation { rule: ValidationRule::EmptyType, .. }));
    }

    #[test]
    fn non_string_key_is_reported_as_wrong_type_not_empty() {
        let e = engine();
        let err = e
            .dispatch("store", Json(json!({"key": 5, "value": "x"})), agent(), None)
            .unwrap_err();
        assert!(matches!(err, AgramaError::Validation { rule: ValidationRule::WrongType, .. }));
    }

    #[test]
    fn lexical_search_finds_indexed_document() {
        let e = engine();
        e.dispatch(
            "store",
            Json(json!({"key": "doc1", "value": "calculateDistance between two points precisely"})),
            agent(),
            None,
        )
        .unwrap();
        let result = e
            .dispatch("search", Json(json!({"query": "calculate", "type": "lexical"})), agent(), None)
            .unwrap();
        let results = result.0["results"].as_array().unwrap();
        assert!(results.iter().any(|r| r["doc_id"] == "doc1"));
    }

    #[test]
    fn link_then_neighbors_contains_edge() {
        let e = engine();
        e.dispatch("link", Json(json!({"from": "A", "to": "B", "relation": "depends_on"})), agent(), None).unwrap();
        let neighbors = e.graph().neighbors("A", Direction::Out, None);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].to, "B");
    }

    #[test]
    fn dependencies_default_depth_comes_from_config() {
        let mut config = Config::default();
        config.fre.max_depth = 1;
        let e = Engine::new(config, test_embed());
        e.dispatch("link", Json(json!({"from": "A", "to": "B", "relation": "depends_on"})), agent(), None).unwrap();
        e.dispatch("link", Json(json!({"from": "B", "to": "C", "relation": "depends_on"})), agent(), None).unwrap();

        let shallow = e.dependencies("A", Direction::Out, None).unwrap();
        assert!(shallow.iter().any(|h| h.node == "B"));
        assert!(!shallow.iter().any(|h| h.node == "C"), "config max_depth=1 must not reach C");

        let deep = e.dependencies("A", Direction::Out, Some(5)).unwrap();
        assert!(deep.iter().any(|h| h.node == "C"), "explicit max_depth overrides the config default");
    }

    #[test]
    fn repeated_link_does_not_duplicate_edge() {
        let e = engine();
        e.dispatch("link", Json(json!({"from": "A", "to": "B", "relation": "depends_on"})), agent(), None).unwrap();
        e.dispatch(
            "link",
            Json(json!({"from": "A", "to": "B", "relation": "depends_on", "metadata": {"v": 2}})),
            agent(),
            None,
        )
        .unwrap();
        assert_eq!(e.graph().neighbors("A", Direction::Out, None).len(), 1);
    }

    #[test]
    fn transform_unknown_operation_is_rejected() {
        let e = engine();
        let err = e
            .dispatch("transform", Json(json!({"operation": "delete_everything", "data": "x"})), agent(), None)
            .unwrap_err();
        assert!(matches!(err, AgramaError::Validation { .. }));
    }

    #[test]
    fn transform_compress_text_is_pure() {
        let e = engine();
        let a = e
            .dispatch("transform", Json(json!({"operation": "compress_text", "data": "hello   world"})), agent(), None)
            .unwrap();
        let b = e
            .dispatch("transform", Json(json!({"operation": "compress_text", "data": "hello   world"})), agent(), None)
            .unwrap();
        assert_eq!(a.0["output"], b.0["output"]);
    }

    #[test]
    fn session_call_count_tracks_every_dispatch() {
        let e = engine();
        e.dispatch("store", Json(json!({"key": "k", "value": "v"})), agent(), None).unwrap();
        e.dispatch("retrieve", Json(json!({"key": "k"})), agent(), None).unwrap();
        let state = e.sessions.get(&agent()).unwrap();
        assert_eq!(state.call_count, 2);
    }

    #[test]
    fn response_cache_serves_repeated_retrieve_without_recomputation() {
        let e = engine();
        e.dispatch("store", Json(json!({"key": "k", "value": "v"})), agent(), None).unwrap();
        let first = e.dispatch("retrieve", Json(json!({"key": "k"})), agent(), None).unwrap();
        let second = e.dispatch("retrieve", Json(json!({"key": "k"})), agent(), None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn store_invalidates_cached_retrieve_for_same_key() {
        let e = engine();
        e.dispatch("store", Json(json!({"key": "k", "value": "v1"})), agent(), None).unwrap();
        e.dispatch("retrieve", Json(json!({"key": "k"})), agent(), None).unwrap();
        e.dispatch("store", Json(json!({"key": "k", "value": "v2"})), agent(), None).unwrap();
        let result = e.dispatch("retrieve", Json(json!({"key": "k"})), agent(), None).unwrap();
        assert_eq!(result.0["value"], "v2");
    }

    #[test]
    fn already_expired_deadline_aborts_before_dispatch() {
        let e = engine();
        let err = e
            .dispatch("store", Json(json!({"key": "k", "value": "v"})), agent(), Some(Duration::from_secs(0)))
            .unwrap_err();
        assert!(matches!(err, AgramaError::DeadlineExceeded { .. }));
    }
}
