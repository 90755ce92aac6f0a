//! Inverted index with Okapi BM25 scoring.

use crate::tokenizer::{tokenize, tokenize_unique};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A single document's hit within a posting list.
#[derive(Debug, Clone)]
struct PostingEntry {
    doc_id: String,
    term_frequency: u32,
}

#[derive(Debug, Clone, Default)]
struct PostingList {
    entries: Vec<PostingEntry>,
}

impl PostingList {
    fn remove(&mut self, doc_id: &str) {
        self.entries.retain(|e| e.doc_id != doc_id);
    }
}

/// A scored lexical search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalHit {
    pub doc_id: String,
    pub score: f32,
}

/// BM25-scored inverted index over identifier-aware tokens.
///
/// Re-indexing a `doc_id` that is already present replaces its posting in
/// O(|doc|) (remove-before-add).
pub struct BM25Index {
    postings: DashMap<String, PostingList>,
    doc_lengths: DashMap<String, u32>,
    total_docs: AtomicUsize,
    total_doc_len: AtomicUsize,
    k1: f32,
    b: f32,
}

impl Default for BM25Index {
    fn default() -> Self {
        Self::new(1.2, 0.75)
    }
}

impl BM25Index {
    pub fn new(k1: f32, b: f32) -> Self {
        BM25Index {
            postings: DashMap::new(),
            doc_lengths: DashMap::new(),
            total_docs: AtomicUsize::new(0),
            total_doc_len: AtomicUsize::new(0),
            k1,
            b,
        }
    }

    fn avg_doc_len(&self) -> f32 {
        let total = self.total_docs.load(Ordering::Acquire);
        if total == 0 {
            return 0.0;
        }
        self.total_doc_len.load(Ordering::Acquire) as f32 / total as f32
    }

    fn doc_freq(&self, term: &str) -> usize {
        self.postings.get(term).map(|p| p.entries.len()).unwrap_or(0)
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.total_docs.load(Ordering::Acquire) as f32;
        let df = self.doc_freq(term) as f32;
        // Standard smoothed IDF: always non-negative.
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Index (or re-index) `doc_id` with `text`.
    #[tracing::instrument(level = "debug", skip(self, text), fields(doc_id))]
    pub fn index(&self, doc_id: &str, text: &str) {
        self.remove(doc_id);

        let tokens = tokenize(text);
        let doc_len = tokens.len() as u32;
        let mut counts: HashMap<String, u32> = HashMap::new();
        for t in &tokens {
            *counts.entry(t.clone()).or_insert(0) += 1;
        }
        for (term, tf) in counts {
            self.postings.entry(term).or_default().entries.push(PostingEntry {
                doc_id: doc_id.to_string(),
                term_frequency: tf,
            });
        }
        self.doc_lengths.insert(doc_id.to_string(), doc_len);
        self.total_docs.fetch_add(1, Ordering::AcqRel);
        self.total_doc_len.fetch_add(doc_len as usize, Ordering::AcqRel);
    }

    /// Remove `doc_id` from the index, if present.
    pub fn remove(&self, doc_id: &str) {
        let Some((_, doc_len)) = self.doc_lengths.remove(doc_id) else {
            return;
        };
        for mut entry in self.postings.iter_mut() {
            entry.remove(doc_id);
        }
        self.total_docs.fetch_sub(1, Ordering::AcqRel);
        self.total_doc_len.fetch_sub(doc_len as usize, Ordering::AcqRel);
    }

    /// Query as an OR of terms, additive per-term BM25 contribution.
    ///
    /// Empty query yields an empty result; a document containing none of
    /// the query tokens is never returned, since only documents with a
    /// non-zero contribution from at least one term are collected.
    #[tracing::instrument(level = "debug", skip(self), fields(k))]
    pub fn search(&self, query: &str, k: usize) -> Vec<LexicalHit> {
        let query_terms = tokenize_unique(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let avg_len = self.avg_doc_len().max(1.0);
        let mut scores: HashMap<String, f32> = HashMap::new();

        for term in &query_terms {
            let idf = self.idf(term);
            if idf <= 0.0 {
                continue;
            }
            let Some(posting) = self.postings.get(term) else {
                continue;
            };
            for entry in &posting.entries {
                let doc_len = self
                    .doc_lengths
                    .get(&entry.doc_id)
                    .map(|d| *d as f32)
                    .unwrap_or(avg_len);
                let tf = entry.term_frequency as f32;
                let denom = tf + self.k1 * (1.0 - self.b + self.b * doc_len / avg_len);
                let contribution = idf * (tf * (self.k1 + 1.0)) / denom;
                *scores.entry(entry.doc_id.clone()).or_insert(0.0) += contribution;
            }
        }

        let mut hits: Vec<LexicalHit> = scores
            .into_iter()
            .map(|(doc_id, score)| LexicalHit { doc_id, score })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        hits.truncate(k);
        hits
    }

    pub fn len(&self) -> usize {
        self.total_docs.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_empty_query_is_empty() {
        let idx = BM25Index::default();
        idx.index("a", "hello world");
        assert!(idx.search("", 10).is_empty());
    }

    #[test]
    fn search_with_no_matches_returns_empty() {
        let idx = BM25Index::default();
        idx.index("a", "hello world");
        let hits = idx.search("zzz", 10);
        assert!(hits.is_empty());
    }

    #[test]
    fn scores_are_non_negative() {
        let idx = BM25Index::default();
        idx.index("a", "calculateDistance");
        idx.index("b", "parseJsonResponse");
        idx.index("c", "validateEmail");
        for hit in idx.search("calculate", 10) {
            assert!(hit.score >= 0.0);
        }
    }

    #[test]
    fn lexical_hit_ranks_matching_doc_first() {
        let idx = BM25Index::default();
        idx.index("1", "calculateDistance");
        idx.index("2", "parseJsonResponse");
        idx.index("3", "validateEmail");
        let hits = idx.search("calculate", 10);
        assert_eq!(hits[0].doc_id, "1");
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn camel_case_tokenization_is_searchable() {
        let idx = BM25Index::default();
        idx.index("1", "getUserDataFromAPI");
        let hits = idx.search("user", 10);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn reindexing_replaces_posting() {
        let idx = BM25Index::default();
        idx.index("1", "alpha");
        idx.index("1", "beta");
        assert!(idx.search("alpha", 10).is_empty());
        assert_eq!(idx.search("beta", 10).len(), 1);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn remove_drops_document_from_results() {
        let idx = BM25Index::default();
        idx.index("1", "alpha beta");
        idx.remove("1");
        assert!(idx.search("alpha", 10).is_empty());
        assert_eq!(idx.len(), 0);
    }

    #[test]
    fn k_truncates_results() {
        let idx = BM25Index::default();
        for i in 0..20 {
            idx.index(&format!("doc{i}"), "shared term");
        }
        let hits = idx.search("shared", 5);
        assert_eq!(hits.len(), 5);
    }

    #[test]
    fn ties_break_by_doc_id() {
        let idx = BM25Index::default();
        idx.index("b", "shared");
        idx.index("a", "shared");
        let hits = idx.search("shared", 10);
        assert_eq!(hits[0].doc_id, "a");
    }
}
