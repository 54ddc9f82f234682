//! Replicated agent state
//!
//! The shared state of one agent across instances: memory ids accumulate
//! (G-Set), metadata entries support add/remove (OR-Set), and attributes
//! are last-writer-wins per key.

use serde::{Deserialize, Serialize};

use chrysalis_core::identifiers::{AgentId, InstanceId};
use chrysalis_core::time::Timestamp;

use crate::gset::GSet;
use crate::lww::LwwMap;
use crate::orset::OrSet;
use crate::Merge;

/// Product of the per-agent CRDTs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSharedState {
    /// Agent the state belongs to
    pub agent_id: AgentId,
    /// Opaque memory ids (append-only)
    pub memories: GSet<String>,
    /// Metadata entries (add/remove)
    pub metadata: OrSet<String>,
    /// Attribute map (LWW per key)
    pub attributes: LwwMap<String, serde_json::Value>,
}

impl AgentSharedState {
    /// Empty state for an agent
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            memories: GSet::new(),
            metadata: OrSet::new(),
            attributes: LwwMap::new(),
        }
    }

    /// Record a memory id
    pub fn add_memory(&mut self, memory_id: impl Into<String>) {
        self.memories.insert(memory_id.into());
    }

    /// Add a metadata entry
    pub fn add_metadata(&mut self, entry: impl Into<String>) {
        self.metadata.add(entry.into());
    }

    /// Remove a metadata entry
    pub fn remove_metadata(&mut self, entry: &str) -> bool {
        self.metadata.remove(&entry.to_string())
    }

    /// Write an attribute
    pub fn set_attribute(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
        timestamp: Timestamp,
        writer: InstanceId,
    ) {
        self.attributes.set(key.into(), value, timestamp, writer);
    }
}

impl Merge for AgentSharedState {
    fn merge(&self, other: &Self) -> Self {
        Self {
            agent_id: self.agent_id.clone(),
            memories: self.memories.merge(&other.memories),
            metadata: self.metadata.merge(&other.metadata),
            attributes: self.attributes.merge(&other.attributes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_combines_all_components() {
        let id = AgentId::new("a1");
        let mut a = AgentSharedState::new(id.clone());
        a.add_memory("m1");
        a.add_metadata("tag:alpha");
        a.set_attribute("mood", json!("curious"), Timestamp::from_millis(1), InstanceId::named("a"));

        let mut b = AgentSharedState::new(id);
        b.add_memory("m2");
        b.set_attribute("mood", json!("focused"), Timestamp::from_millis(2), InstanceId::named("b"));

        let merged = a.merge(&b);
        assert!(merged.memories.contains(&"m1".to_string()));
        assert!(merged.memories.contains(&"m2".to_string()));
        assert!(merged.metadata.contains(&"tag:alpha".to_string()));
        assert_eq!(merged.attributes.get(&"mood".to_string()), Some(&json!("focused")));
    }
}
