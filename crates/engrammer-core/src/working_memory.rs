//! Per-(tenant, session) working-memory slot.
//!
//! One mutable text value per session: the retrieval result currently "in
//! focus" for the topic-gated pipeline. Overwritten wholesale on topic
//! switch; cleared only by explicit session reset.

use dashmap::DashMap;

#[derive(Default)]
pub struct WorkingMemory {
    slots: DashMap<String, String>,
}

fn slot_key(tenant_id: &str, session_id: &str) -> String {
    format!("{}:{}", tenant_id, session_id)
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, tenant_id: &str, session_id: &str, content: impl Into<String>) {
        self.slots.insert(slot_key(tenant_id, session_id), content.into());
    }

    /// Current value, or empty string when nothing is in focus.
    pub fn get(&self, tenant_id: &str, session_id: &str) -> String {
        self.slots
            .get(&slot_key(tenant_id, session_id))
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self, tenant_id: &str, session_id: &str) {
        self.slots.remove(&slot_key(tenant_id, session_id));
    }
}
