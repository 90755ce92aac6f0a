//! Per-agent session bookkeeping, updated after each successful dispatch.

use agrama_core::{AgentId, Timestamp};
use dashmap::DashMap;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Capabilities granted to this agent. No primitive currently carries a
    /// capability-granting argument, so this is empty until the session is
    /// explicitly seeded via [`SessionTable::grant_capabilities`]; the field
    /// exists so a future authorization layer has somewhere to read from.
    pub capabilities: Vec<String>,
    pub call_count: u64,
    pub last_seen: Timestamp,
    pub primitives_invoked: std::collections::BTreeMap<String, u64>,
}

pub struct SessionTable {
    sessions: DashMap<AgentId, SessionState>,
}

impl SessionTable {
    pub fn new() -> Self {
        SessionTable {
            sessions: DashMap::new(),
        }
    }

    pub fn record(&self, agent: &AgentId, primitive: &str, timestamp: Timestamp) {
        let mut entry = self.sessions.entry(agent.clone()).or_default();
        entry.call_count += 1;
        entry.last_seen = timestamp;
        *entry.primitives_invoked.entry(primitive.to_string()).or_insert(0) += 1;
    }

    /// Sets the capability list for `agent`'s session, creating the session
    /// (with zeroed counters) if this is the first time it's been observed.
    pub fn grant_capabilities(&self, agent: &AgentId, capabilities: Vec<String>) {
        let mut entry = self.sessions.entry(agent.clone()).or_default();
        entry.capabilities = capabilities;
    }

    pub fn get(&self, agent: &AgentId) -> Option<SessionState> {
        self.sessions.get(agent).map(|e| e.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}
