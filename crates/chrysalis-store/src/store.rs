//! The temporal store
//!
//! One append-only log per agent, guarded by its own lock so writers to
//! different agents never contend. The predecessor is closed and the
//! successor appended under the same write lock, so readers never observe
//! a half-committed version change.

use async_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use chrysalis_core::errors::{ChrysalisError, Result};
use chrysalis_core::identifiers::{AgentId, FrameworkTag};
use chrysalis_core::model::namespaces::ontology;
use chrysalis_core::model::{parse_quads, serialize_quads, AgentSummary, Quad, Subject, Term};
use chrysalis_core::time::Timestamp;

use crate::query::{evaluate, QuadPattern, SelectResult, TriplePattern};
use crate::snapshot::{Snapshot, SnapshotMeta, SnapshotSelector};

/// Aggregate store statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Agents with at least one snapshot
    pub total_agents: u64,
    /// Snapshots across all agents
    pub total_snapshots: u64,
    /// Quads across all snapshots
    pub total_quads: u64,
}

/// Filter for agent discovery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryCriteria {
    /// Case-insensitive substring of the agent name
    pub name_contains: Option<String>,
    /// Tool names the agent must expose (all of them)
    pub has_capability: Vec<String>,
    /// Source framework of the current snapshot
    pub framework: Option<FrameworkTag>,
}

/// Serializable export of one snapshot (N-Triples plus sidecar metadata)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotExport {
    /// Version number
    pub version: u64,
    /// Valid-from instant
    pub valid_from: Timestamp,
    /// Valid-to instant, if closed
    pub valid_to: Option<Timestamp>,
    /// Transaction time
    pub recorded_at: Timestamp,
    /// Source framework
    pub source_format: FrameworkTag,
    /// Fidelity score
    pub fidelity_score: f64,
    /// Quads as N-Triples text
    pub ntriples: String,
}

/// Serializable export of an agent's full history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentExport {
    /// Agent id
    pub agent_id: AgentId,
    /// Snapshots in ascending version order
    pub snapshots: Vec<SnapshotExport>,
}

#[derive(Debug, Default)]
struct AgentLog {
    snapshots: Vec<Snapshot>,
}

impl AgentLog {
    fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    fn as_of(&self, t: Timestamp) -> Option<&Snapshot> {
        // Versions are append-ordered by valid_from, so binary search works
        let idx = self.snapshots.partition_point(|s| s.valid_from <= t);
        if idx == 0 {
            return None;
        }
        let candidate = &self.snapshots[idx - 1];
        candidate.contains_time(t).then_some(candidate)
    }
}

/// Bi-temporal quad store with one named graph per snapshot
pub struct TemporalStore {
    agents: RwLock<BTreeMap<AgentId, Arc<RwLock<AgentLog>>>>,
    disposed: AtomicBool,
}

impl TemporalStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(BTreeMap::new()),
            disposed: AtomicBool::new(false),
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(ChrysalisError::disposed("temporal store"));
        }
        Ok(())
    }

    /// Release the store; all later calls fail with `Disposed`
    ///
    /// Double disposal is a no-op.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    async fn log_for(&self, agent_id: &AgentId, create: bool) -> Option<Arc<RwLock<AgentLog>>> {
        if !create {
            return self.agents.read().await.get(agent_id).cloned();
        }
        let mut agents = self.agents.write().await;
        Some(
            agents
                .entry(agent_id.clone())
                .or_insert_with(|| Arc::new(RwLock::new(AgentLog::default())))
                .clone(),
        )
    }

    /// Append a new snapshot for an agent
    ///
    /// Assigns the next version, rewrites the quads into the snapshot's
    /// named graph, and closes the predecessor at the new `valid_from` in
    /// the same critical section. When `expected_version` is supplied and
    /// does not match the current head, the write fails with
    /// `TemporalConflict` and nothing is changed.
    pub async fn create_snapshot(
        &self,
        agent_id: &AgentId,
        quads: Vec<Quad>,
        meta: SnapshotMeta,
        expected_version: Option<u64>,
    ) -> Result<Snapshot> {
        self.ensure_live()?;
        let log = self
            .log_for(agent_id, true)
            .await
            .ok_or_else(|| ChrysalisError::internal("agent log vanished"))?;
        let mut log = log.write().await;

        let current_version = log.latest().map(|s| s.version).unwrap_or(0);
        if let Some(expected) = expected_version {
            if expected != current_version {
                return Err(ChrysalisError::TemporalConflict {
                    expected,
                    actual: current_version,
                });
            }
        }

        let version = current_version + 1;
        let now = Timestamp::now();
        let mut valid_from = meta.valid_from.unwrap_or(now);
        if let Some(prev) = log.latest() {
            // Valid intervals must not overlap; clamp forward on clock ties
            if valid_from <= prev.valid_from {
                valid_from = Timestamp::from_millis(prev.valid_from.as_millis() + 1);
            }
        }

        let graph = chrysalis_core::model::GraphName::named(Snapshot::graph_iri(agent_id, version));
        let quads: Vec<Quad> = quads.into_iter().map(|q| q.with_graph(graph.clone())).collect();

        if let Some(prev) = log.snapshots.last_mut() {
            prev.valid_to = Some(valid_from);
        }

        let snapshot = Snapshot {
            agent_id: agent_id.clone(),
            version,
            quads,
            valid_from,
            valid_to: None,
            recorded_at: now,
            source_format: meta.source_format,
            fidelity_score: meta.fidelity_score,
        };
        debug!(agent = %agent_id, version, "created snapshot");
        log.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    /// Fetch a snapshot by selector; absence is `Ok(None)`
    pub async fn get_snapshot(
        &self,
        agent_id: &AgentId,
        selector: SnapshotSelector,
    ) -> Result<Option<Snapshot>> {
        self.ensure_live()?;
        let Some(log) = self.log_for(agent_id, false).await else {
            return Ok(None);
        };
        let log = log.read().await;
        let found = match selector {
            SnapshotSelector::Latest => log.latest(),
            SnapshotSelector::Version(v) => log.snapshots.iter().find(|s| s.version == v),
            SnapshotSelector::AsOf(t) => log.as_of(t),
        };
        Ok(found.cloned())
    }

    /// Full history in ascending version order
    pub async fn get_history(&self, agent_id: &AgentId) -> Result<Vec<Snapshot>> {
        self.ensure_live()?;
        let Some(log) = self.log_for(agent_id, false).await else {
            return Ok(Vec::new());
        };
        let log = log.read().await;
        Ok(log.snapshots.clone())
    }

    /// Quad query across agents
    ///
    /// For each agent the snapshot chosen by `selector` (default latest)
    /// contributes its quads; the pattern filters with AND semantics. A
    /// graph constraint in the pattern naturally scopes to one snapshot.
    pub async fn query(
        &self,
        pattern: &QuadPattern,
        selector: Option<SnapshotSelector>,
    ) -> Result<Vec<Quad>> {
        self.ensure_live()?;
        let selector = selector.unwrap_or(SnapshotSelector::Latest);
        let logs: Vec<Arc<RwLock<AgentLog>>> =
            self.agents.read().await.values().cloned().collect();

        let mut out = Vec::new();
        for log in logs {
            let log = log.read().await;
            let chosen = match selector {
                SnapshotSelector::Latest => log.latest(),
                SnapshotSelector::Version(v) => log.snapshots.iter().find(|s| s.version == v),
                SnapshotSelector::AsOf(t) => log.as_of(t),
            };
            if let Some(snapshot) = chosen {
                out.extend(snapshot.quads.iter().filter(|q| pattern.matches(q)).cloned());
            }
        }
        Ok(out)
    }

    /// Conjunctive select with variable bindings over current snapshots
    ///
    /// Blank node identity is local to a snapshot, so labels are qualified
    /// by their graph before evaluation; equal labels from different
    /// snapshots never join.
    pub async fn select(&self, patterns: &[TriplePattern]) -> Result<SelectResult> {
        self.ensure_live()?;
        let quads: Vec<Quad> = self
            .query(&QuadPattern::any(), None)
            .await?
            .into_iter()
            .map(qualify_blank_labels)
            .collect();
        Ok(evaluate(patterns, &quads))
    }

    /// Discover agents matching the criteria, from current snapshots
    pub async fn discover_agents(&self, criteria: &DiscoveryCriteria) -> Result<Vec<AgentSummary>> {
        self.ensure_live()?;
        let entries: Vec<(AgentId, Arc<RwLock<AgentLog>>)> = self
            .agents
            .read()
            .await
            .iter()
            .map(|(id, log)| (id.clone(), log.clone()))
            .collect();

        let mut summaries = Vec::new();
        for (agent_id, log) in entries {
            let log = log.read().await;
            let Some(current) = log.latest() else {
                continue;
            };
            let summary = summarize(&agent_id, current, log.snapshots.len() as u64);

            if let Some(fragment) = &criteria.name_contains {
                let matched = summary
                    .name
                    .as_deref()
                    .map(|n| n.to_lowercase().contains(&fragment.to_lowercase()))
                    .unwrap_or(false);
                if !matched {
                    continue;
                }
            }
            if let Some(framework) = &criteria.framework {
                if &summary.framework != framework {
                    continue;
                }
            }
            if !criteria
                .has_capability
                .iter()
                .all(|cap| summary.capabilities.iter().any(|c| c == cap))
            {
                continue;
            }
            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// Remove every version of an agent; returns whether anything existed
    pub async fn delete_agent(&self, agent_id: &AgentId) -> Result<bool> {
        self.ensure_live()?;
        let removed = self.agents.write().await.remove(agent_id).is_some();
        if removed {
            debug!(agent = %agent_id, "deleted agent history");
        }
        Ok(removed)
    }

    /// Aggregate counts
    pub async fn stats(&self) -> Result<StoreStats> {
        self.ensure_live()?;
        let logs: Vec<Arc<RwLock<AgentLog>>> =
            self.agents.read().await.values().cloned().collect();
        let mut stats = StoreStats {
            total_agents: 0,
            total_snapshots: 0,
            total_quads: 0,
        };
        for log in logs {
            let log = log.read().await;
            if log.snapshots.is_empty() {
                continue;
            }
            stats.total_agents += 1;
            stats.total_snapshots += log.snapshots.len() as u64;
            stats.total_quads += log.snapshots.iter().map(|s| s.quads.len() as u64).sum::<u64>();
        }
        Ok(stats)
    }

    /// Export an agent's history as N-Triples plus sidecar metadata
    pub async fn export_agent(&self, agent_id: &AgentId) -> Result<AgentExport> {
        self.ensure_live()?;
        let history = self.get_history(agent_id).await?;
        if history.is_empty() {
            return Err(ChrysalisError::not_found(format!("agent {}", agent_id)));
        }
        Ok(AgentExport {
            agent_id: agent_id.clone(),
            snapshots: history
                .into_iter()
                .map(|s| SnapshotExport {
                    version: s.version,
                    valid_from: s.valid_from,
                    valid_to: s.valid_to,
                    recorded_at: s.recorded_at,
                    source_format: s.source_format,
                    fidelity_score: s.fidelity_score,
                    ntriples: serialize_quads(&s.quads),
                })
                .collect(),
        })
    }

    /// Import an exported history into an empty agent slot
    pub async fn import_agent(&self, export: AgentExport) -> Result<()> {
        self.ensure_live()?;
        let log = self
            .log_for(&export.agent_id, true)
            .await
            .ok_or_else(|| ChrysalisError::internal("agent log vanished"))?;
        let mut log = log.write().await;
        if !log.snapshots.is_empty() {
            return Err(ChrysalisError::storage(format!(
                "agent {} already has history",
                export.agent_id
            )));
        }
        for entry in export.snapshots {
            let quads = parse_quads(&entry.ntriples)?;
            log.snapshots.push(Snapshot {
                agent_id: export.agent_id.clone(),
                version: entry.version,
                quads,
                valid_from: entry.valid_from,
                valid_to: entry.valid_to,
                recorded_at: entry.recorded_at,
                source_format: entry.source_format,
                fidelity_score: entry.fidelity_score,
            });
        }
        Ok(())
    }
}

impl Default for TemporalStore {
    fn default() -> Self {
        Self::new()
    }
}

fn qualify_blank_labels(quad: Quad) -> Quad {
    use chrysalis_core::model::{BlankNode, GraphName};

    let graph_iri = match &quad.graph {
        GraphName::Named(n) => n.as_str().to_string(),
        GraphName::Default => String::new(),
    };
    let qualify = |b: &BlankNode| BlankNode::new(format!("{}|{}", graph_iri, b.as_str()));

    let subject = match &quad.subject {
        Subject::Blank(b) => Subject::Blank(qualify(b)),
        other => other.clone(),
    };
    let object = match &quad.object {
        Term::Blank(b) => Term::Blank(qualify(b)),
        other => other.clone(),
    };
    Quad {
        subject,
        object,
        ..quad
    }
}

fn summarize(agent_id: &AgentId, snapshot: &Snapshot, version_count: u64) -> AgentSummary {
    let agent_subject = Subject::named(agent_id.iri());

    let name = snapshot.quads.iter().find_map(|q| {
        (q.subject == agent_subject && q.predicate.as_str() == ontology::NAME)
            .then(|| q.object.as_literal().map(|l| l.lexical.clone()))
            .flatten()
    });

    // Tools hang off the agent as typed blank nodes carrying a name literal
    let mut capabilities = Vec::new();
    for quad in &snapshot.quads {
        if quad.subject == agent_subject && quad.predicate.as_str() == ontology::HAS_TOOL {
            if let Term::Blank(tool_node) = &quad.object {
                let tool_subject = Subject::Blank(tool_node.clone());
                if let Some(tool_name) = snapshot.quads.iter().find_map(|q| {
                    (q.subject == tool_subject && q.predicate.as_str() == ontology::NAME)
                        .then(|| q.object.as_literal().map(|l| l.lexical.clone()))
                        .flatten()
                }) {
                    capabilities.push(tool_name);
                }
            }
        }
    }

    AgentSummary {
        id: agent_id.clone(),
        name,
        framework: snapshot.source_format.clone(),
        capabilities,
        version_count,
        updated_at: snapshot.recorded_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrysalis_core::model::namespaces::{ontology as ont, rdf_type};

    fn agent_quads(agent_id: &AgentId, name: &str) -> Vec<Quad> {
        vec![
            Quad::new(
                Subject::named(agent_id.iri()),
                rdf_type(),
                Term::named(ont::AGENT),
            ),
            Quad::new(
                Subject::named(agent_id.iri()),
                ont::NAME,
                Term::literal(name),
            ),
        ]
    }

    #[tokio::test]
    async fn versions_increase_and_predecessor_closes() {
        let store = TemporalStore::new();
        let id = AgentId::new("a1");
        let meta = SnapshotMeta::from_framework("usa");

        let v1 = store
            .create_snapshot(&id, agent_quads(&id, "v1"), meta.clone(), None)
            .await
            .unwrap();
        let v2 = store
            .create_snapshot(&id, agent_quads(&id, "v2"), meta, None)
            .await
            .unwrap();
        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);

        let history = store.get_history(&id).await.unwrap();
        assert_eq!(history[0].valid_to, Some(history[1].valid_from));
        assert!(history[1].is_current());
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts() {
        let store = TemporalStore::new();
        let id = AgentId::new("a1");
        let meta = SnapshotMeta::from_framework("usa");

        store
            .create_snapshot(&id, agent_quads(&id, "v1"), meta.clone(), Some(0))
            .await
            .unwrap();
        let err = store
            .create_snapshot(&id, agent_quads(&id, "v2"), meta, Some(0))
            .await
            .unwrap_err();
        assert_matches!(err, ChrysalisError::TemporalConflict { expected: 0, actual: 1 });
    }

    #[tokio::test]
    async fn quads_land_in_versioned_named_graph() {
        let store = TemporalStore::new();
        let id = AgentId::new("a1");
        let snapshot = store
            .create_snapshot(
                &id,
                agent_quads(&id, "v1"),
                SnapshotMeta::from_framework("usa"),
                None,
            )
            .await
            .unwrap();
        assert!(snapshot.quads.iter().all(|q| q.graph == snapshot.graph()));
    }

    #[tokio::test]
    async fn missing_agent_is_explicit_absence() {
        let store = TemporalStore::new();
        let found = store
            .get_snapshot(&AgentId::new("ghost"), SnapshotSelector::Latest)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn delete_removes_all_versions() {
        let store = TemporalStore::new();
        let id = AgentId::new("a1");
        let meta = SnapshotMeta::from_framework("usa");
        store
            .create_snapshot(&id, agent_quads(&id, "v1"), meta.clone(), None)
            .await
            .unwrap();
        store
            .create_snapshot(&id, agent_quads(&id, "v2"), meta, None)
            .await
            .unwrap();

        assert!(store.delete_agent(&id).await.unwrap());
        assert!(!store.delete_agent(&id).await.unwrap());
        assert!(store.get_history(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dispose_is_idempotent_and_fatal() {
        let store = TemporalStore::new();
        store.dispose();
        store.dispose();
        let err = store.stats().await.unwrap_err();
        assert_matches!(err, ChrysalisError::Disposed { .. });
    }

    #[tokio::test]
    async fn export_import_round_trip() {
        let store = TemporalStore::new();
        let id = AgentId::new("a1");
        store
            .create_snapshot(
                &id,
                agent_quads(&id, "v1"),
                SnapshotMeta::from_framework("usa"),
                None,
            )
            .await
            .unwrap();
        let export = store.export_agent(&id).await.unwrap();

        let other = TemporalStore::new();
        other.import_agent(export).await.unwrap();
        let history = other.get_history(&id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].quads.len(), 2);
    }
}
