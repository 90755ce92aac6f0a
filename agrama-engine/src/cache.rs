//! Response cache: fingerprint-keyed, TTL-expiring, LRU-bounded.
//!
//! Writes (`store`, `link`) never populate or read this cache; they call
//! [`ResponseCache::invalidate_key`] instead, which drops cached `retrieve`
//! results whose arguments named the written key exactly. Entries whose
//! arguments merely overlap the written key in some looser sense are left
//! in place and simply expire on their own TTL.

use crate::fingerprint::Fingerprint;
use agrama_core::Json;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    value: Json,
    inserted_at: Instant,
    last_accessed: Instant,
    referenced_key: Option<String>,
}

pub struct ResponseCache {
    entries: DashMap<Fingerprint, CacheEntry>,
    ttl: Duration,
    capacity: usize,
}

impl ResponseCache {
    pub fn new(ttl_ms: u64, capacity: usize) -> Self {
        ResponseCache {
            entries: DashMap::new(),
            ttl: Duration::from_millis(ttl_ms),
            capacity,
        }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Json> {
        let mut entry = self.entries.get_mut(fingerprint)?;
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(fingerprint);
            return None;
        }
        entry.last_accessed = Instant::now();
        Some(entry.value.clone())
    }

    pub fn put(&self, fingerprint: Fingerprint, value: Json, referenced_key: Option<String>) {
        let now = Instant::now();
        self.entries.insert(
            fingerprint,
            CacheEntry {
                value,
                inserted_at: now,
                last_accessed: now,
                referenced_key,
            },
        );
        self.evict_if_over_capacity();
    }

    fn evict_if_over_capacity(&self) {
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|e| e.last_accessed)
                .map(|e| e.key().clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Drop cached entries whose arguments named `key` exactly.
    pub fn invalidate_key(&self, key: &str) {
        self.entries.retain(|_, entry| entry.referenced_key.as_deref() != Some(key));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn fp(s: &str) -> Fingerprint {
        Fingerprint::compute("retrieve", &Json(serde_json::json!({"key": s})))
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = ResponseCache::new(5000, 10);
        cache.put(fp("a"), Json(serde_json::json!({"exists": true})), Some("a".into()));
        assert!(cache.get(&fp("a")).is_some());
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let cache = ResponseCache::new(1, 10);
        cache.put(fp("a"), Json::null(), Some("a".into()));
        sleep(Duration::from_millis(5));
        assert!(cache.get(&fp("a")).is_none());
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let cache = ResponseCache::new(5000, 2);
        cache.put(fp("a"), Json::null(), Some("a".into()));
        cache.put(fp("b"), Json::null(), Some("b".into()));
        // touch "a" so it is not the least-recently-used entry
        cache.get(&fp("a"));
        cache.put(fp("c"), Json::null(), Some("c".into()));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&fp("a")).is_some());
        assert!(cache.get(&fp("b")).is_none());
    }

    #[test]
    fn invalidate_key_drops_only_matching_entries() {
        let cache = ResponseCache::new(5000, 10);
        cache.put(fp("a"), Json::null(), Some("a".into()));
        cache.put(fp("b"), Json::null(), Some("b".into()));
        cache.invalidate_key("a");
        assert!(cache.get(&fp("a")).is_none());
        assert!(cache.get(&fp("b")).is_some());
    }
}
