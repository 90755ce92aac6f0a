//! The per-key record and its append-only history.

use agrama_core::types::{AgentId, Version};
use agrama_core::Json;

/// One historical write to a key.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub version: Version,
    pub timestamp: u64,
    pub value: Vec<u8>,
    pub author: AgentId,
}

/// A single key's current value, metadata sidecar, and full history.
#[derive(Debug, Default)]
pub struct Record {
    pub history: Vec<HistoryEntry>,
    pub metadata: Option<Json>,
    next_version: Version,
}

impl Record {
    pub fn new() -> Self {
        Record {
            history: Vec::new(),
            metadata: None,
            next_version: 1,
        }
    }

    /// Append a new entry, returning its assigned version.
    ///
    /// Invariant: `history(K)[v]` equals the value passed to the
    /// `put` that produced version `v`, for every `v <= current(K)`.
    pub fn append(&mut self, value: Vec<u8>, author: AgentId) -> Version {
        let version = self.next_version;
        self.next_version += 1;
        self.history.push(HistoryEntry {
            version,
            timestamp: now_micros(),
            value,
            author,
        });
        version
    }

    /// The most recent entry, i.e. the value `retrieve` returns.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }
}

fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
