//! Versioned agent snapshots

use serde::{Deserialize, Serialize};

use chrysalis_core::identifiers::{AgentId, FrameworkTag};
use chrysalis_core::model::namespaces::GRAPH_BASE;
use chrysalis_core::model::{GraphName, Quad};
use chrysalis_core::time::Timestamp;

/// An immutable versioned record of an agent's quads
///
/// Versions start at 1 and increase by one. At most one snapshot per agent
/// has `valid_to == None`; superseding a snapshot closes it at the
/// successor's `valid_from` without touching its quads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Owning agent
    pub agent_id: AgentId,
    /// Version number (1-based, strictly increasing)
    pub version: u64,
    /// The agent's quads, rewritten into this snapshot's named graph
    pub quads: Vec<Quad>,
    /// Start of the valid-time interval
    pub valid_from: Timestamp,
    /// End of the valid-time interval; `None` marks the current snapshot
    pub valid_to: Option<Timestamp>,
    /// Transaction time the snapshot was recorded
    pub recorded_at: Timestamp,
    /// Framework of the native document this snapshot came from
    pub source_format: FrameworkTag,
    /// Fidelity of the translation that produced it
    pub fidelity_score: f64,
}

impl Snapshot {
    /// Named-graph IRI for an agent version
    pub fn graph_iri(agent_id: &AgentId, version: u64) -> String {
        format!("{}{}/v{}", GRAPH_BASE, agent_id, version)
    }

    /// This snapshot's named graph
    pub fn graph(&self) -> GraphName {
        GraphName::named(Self::graph_iri(&self.agent_id, self.version))
    }

    /// Whether this is the open-ended current snapshot
    pub fn is_current(&self) -> bool {
        self.valid_to.is_none()
    }

    /// Whether the valid interval contains `t` (`valid_from <= t < valid_to`)
    pub fn contains_time(&self, t: Timestamp) -> bool {
        t >= self.valid_from && self.valid_to.map(|end| t < end).unwrap_or(true)
    }
}

/// Caller-supplied metadata for snapshot creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Framework of the source document
    pub source_format: FrameworkTag,
    /// Translation fidelity
    pub fidelity_score: f64,
    /// Explicit valid-from override (defaults to now)
    pub valid_from: Option<Timestamp>,
}

impl SnapshotMeta {
    /// Metadata for a snapshot taken directly from a framework
    pub fn from_framework(framework: impl Into<FrameworkTag>) -> Self {
        Self {
            source_format: framework.into(),
            fidelity_score: 1.0,
            valid_from: None,
        }
    }

    /// Set an explicit valid-from instant
    pub fn valid_at(mut self, t: Timestamp) -> Self {
        self.valid_from = Some(t);
        self
    }

    /// Set the fidelity score
    pub fn with_fidelity(mut self, score: f64) -> Self {
        self.fidelity_score = score;
        self
    }
}

/// How to pick a snapshot out of an agent's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotSelector {
    /// Exact version
    Version(u64),
    /// The snapshot valid at an instant
    AsOf(Timestamp),
    /// The current snapshot
    Latest,
}
