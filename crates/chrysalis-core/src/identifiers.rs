//! Core identifier types used across the Chrysalis workspace
//!
//! This module provides the fundamental identifier types that uniquely
//! identify agents, instances, messages, and operations within the system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Agent identifier
///
/// Identifies an agent across frameworks and snapshots. Agent ids come from
/// the source document where available, otherwise they are derived
/// deterministically from the agent's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Create a new agent ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a deterministic agent ID from an agent name
    pub fn from_name(name: &str) -> Self {
        let uuid = Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes());
        Self(format!("{}-{}", slugify(name), &uuid.to_string()[..8]))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical IRI for this agent: `https://chrysalis.dev/agent/<id>`
    pub fn iri(&self) -> String {
        format!("{}{}", crate::model::namespaces::AGENT_BASE, self.0)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("agent");
    }
    out
}

/// Instance identifier for distributed replicas
///
/// Each running Chrysalis instance has a unique InstanceId. It keys vector
/// clock slots and breaks LWW ties, so its ordering must be deterministic
/// across replicas (lexicographic on the string form).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
    /// Create a new random instance ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a named instance ID (tests and fixed deployments)
    pub fn named(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Gossip message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Create a new random message ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(MessageId(Uuid::parse_str(s)?))
    }
}

/// Event identifier for event bus entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Create a new random event ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event-{}", self.0)
    }
}

/// Correlation identifier threading one orchestrator operation through
/// errors, events, and tracing spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    /// Create a new random correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "corr-{}", self.0)
    }
}

/// Framework tag identifying a source or target agent framework
///
/// Tags are lowercase and stable; they key the adapter registry and the
/// translation cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameworkTag(String);

impl FrameworkTag {
    /// Create a new framework tag (normalized to lowercase)
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into().to_ascii_lowercase())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameworkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FrameworkTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for FrameworkTag {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_id_from_name_is_deterministic() {
        let a = AgentId::from_name("Research Agent");
        let b = AgentId::from_name("Research Agent");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("research-agent-"));
    }

    #[test]
    fn agent_iri_uses_canonical_base() {
        let id = AgentId::new("abc");
        assert_eq!(id.iri(), "https://chrysalis.dev/agent/abc");
    }

    #[test]
    fn framework_tag_normalizes_case() {
        assert_eq!(FrameworkTag::new("USA"), FrameworkTag::new("usa"));
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(AgentId::from_name("a  b!c").as_str().split('-').count(), 4);
    }
}
