//! Temporal Store.
//!
//! A keyed content store with append-only per-key version history and an
//! opaque metadata sidecar. Writes are total-ordered per key by a logical
//! clock; readers always observe a consistent snapshot of a single key.
//! Cross-key snapshots are not guaranteed.

mod record;

pub use record::{HistoryEntry, Record};

use agrama_core::error::{AgramaError, Result, ValidationRule};
use agrama_core::types::{AgentId, Version};
use agrama_core::{Json, Limits};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// One key's full state: current value, version, history, and metadata
/// sidecar, guarded by a single lock so a `put` and a `history` read can
/// never interleave inconsistently: readers always observe a consistent
/// snapshot of a single key.
struct Slot {
    inner: RwLock<Record>,
}

/// The Temporal Store.
///
/// Cheaply cloneable: internally an `Arc` over a sharded concurrent map, so
/// concurrent writers to different keys never contend.
#[derive(Clone)]
pub struct TemporalStore {
    slots: Arc<DashMap<String, Slot>>,
    limits: Limits,
}

impl Default for TemporalStore {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl TemporalStore {
    pub fn new(limits: Limits) -> Self {
        TemporalStore {
            slots: Arc::new(DashMap::new()),
            limits,
        }
    }

    fn validate_key(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(AgramaError::validation(
                ValidationRule::EmptyKey,
                "key must not be empty",
            ));
        }
        if key.len() > self.limits.max_key_bytes {
            return Err(AgramaError::ResourceExhausted(format!(
                "key length {} exceeds limit {}",
                key.len(),
                self.limits.max_key_bytes
            )));
        }
        Ok(())
    }

    /// Append a new value to `key`'s history and update its current value.
    ///
    /// Fails with a validation error on empty `key`/`value` before touching
    /// any state. Not idempotent by design: two identical `put` calls yield
    /// two history entries with distinct versions (see `DESIGN.md`).
    #[tracing::instrument(level = "debug", skip(self, value), fields(key, value_len = value.len()))]
    pub fn put(&self, key: &str, value: impl Into<Vec<u8>>, author: AgentId) -> Result<Version> {
        self.validate_key(key)?;
        let value = value.into();
        if value.is_empty() {
            return Err(AgramaError::validation(
                ValidationRule::EmptyValue,
                "value must not be empty",
            ));
        }
        if value.len() > self.limits.max_value_bytes {
            return Err(AgramaError::ResourceExhausted(format!(
                "value length {} exceeds limit {}",
                value.len(),
                self.limits.max_value_bytes
            )));
        }

        let slot = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Slot {
                inner: RwLock::new(Record::new()),
            });
        let mut record = slot.inner.write();
        let version = record.append(value, author);
        if record.history.len() > self.limits.max_history_len {
            let drop_count = record.history.len() - self.limits.max_history_len;
            record.history.drain(..drop_count);
        }
        tracing::trace!(key, version, "store.put");
        Ok(version)
    }

    /// Fetch the current value and metadata for `key`, if present.
    pub fn get(&self, key: &str) -> Option<(Vec<u8>, Option<Json>)> {
        let slot = self.slots.get(key)?;
        let record = slot.inner.read();
        record
            .current()
            .map(|entry| (entry.value.clone(), record.metadata.clone()))
    }

    /// Version history for `key`, newest first, optionally bounded by
    /// `limit`. Returns an empty sequence (never an error) if the key is
    /// unknown or has no history.
    pub fn history(&self, key: &str, limit: Option<usize>) -> Vec<HistoryEntry> {
        let Some(slot) = self.slots.get(key) else {
            return Vec::new();
        };
        let record = slot.inner.read();
        let mut entries: Vec<HistoryEntry> = record.history.iter().cloned().rev().collect();
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }

    /// Replace the metadata sidecar for `key`.
    pub fn put_meta(&self, key: &str, object: Json) -> Result<()> {
        self.validate_key(key)?;
        let depth = object.depth();
        if depth > self.limits.max_metadata_depth {
            return Err(AgramaError::ResourceExhausted(format!(
                "metadata nesting depth {depth} exceeds limit {}",
                self.limits.max_metadata_depth
            )));
        }
        let slot = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Slot {
                inner: RwLock::new(Record::new()),
            });
        slot.inner.write().metadata = Some(object);
        Ok(())
    }

    /// Fetch the metadata sidecar for `key`, if any.
    pub fn get_meta(&self, key: &str) -> Option<Json> {
        self.slots.get(key)?.inner.read().metadata.clone()
    }

    /// True if `key` has ever been written.
    pub fn contains(&self, key: &str) -> bool {
        self.slots
            .get(key)
            .map(|s| s.inner.read().current().is_some())
            .unwrap_or(false)
    }

    /// Delete `key` and its metadata sidecar. The sidecar's lifecycle is
    /// bound to the key.
    pub fn delete(&self, key: &str) -> bool {
        self.slots.remove(key).is_some()
    }

    /// Number of distinct keys ever written (including deleted entries still
    /// tracked internally is not applicable: `delete` removes the slot).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
