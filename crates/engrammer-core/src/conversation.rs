//! Append-only, per-(tenant, session) conversation history.
//!
//! Sessions are created implicitly on first access and never expire on their
//! own; pipelines call [`ConversationLog::clear`] on termination. History is
//! process-local by design and lost on restart.

use crate::shared::{Role, Turn, TurnContent};
use dashmap::DashMap;

fn session_key(tenant_id: &str, session_id: &str) -> String {
    format!("{}:{}", tenant_id, session_id)
}

/// Ordered message history per (tenant, session). No cross-session
/// visibility; ordering is insertion order and semantically meaningful
/// (the preamble, when present, is entry 0).
#[derive(Default)]
pub struct ConversationLog {
    sessions: DashMap<String, Vec<Turn>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn, creating the session implicitly.
    pub fn append(&self, tenant_id: &str, session_id: &str, role: Role, content: TurnContent) {
        self.sessions
            .entry(session_key(tenant_id, session_id))
            .or_default()
            .push(Turn { role, content });
    }

    /// Snapshot copy of a session's history. Callers cannot mutate the log
    /// through the returned vector.
    pub fn get(&self, tenant_id: &str, session_id: &str) -> Vec<Turn> {
        self.sessions
            .get(&session_key(tenant_id, session_id))
            .map(|turns| turns.clone())
            .unwrap_or_default()
    }

    /// Drops the session's history entirely, including any preamble.
    pub fn clear(&self, tenant_id: &str, session_id: &str) {
        self.sessions.remove(&session_key(tenant_id, session_id));
    }
}
