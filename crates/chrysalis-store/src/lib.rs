//! # Chrysalis Temporal Store
//!
//! Bi-temporal quad store for canonical agents. Each agent owns an
//! append-only sequence of immutable [`Snapshot`]s; every snapshot lives in
//! its own named graph and carries both valid-time bounds and the
//! transaction time it was recorded at. Point-in-time queries select the
//! snapshot whose valid interval contains the asked instant.
//!
//! Writers serialize per agent; readers work on cloned immutable snapshots
//! and never block writers of other agents.

#![forbid(unsafe_code)]

pub mod query;
pub mod snapshot;
pub mod store;

pub use query::{PatternTerm, QuadPattern, SelectResult, TriplePattern};
pub use snapshot::{Snapshot, SnapshotMeta, SnapshotSelector};
pub use store::{AgentExport, DiscoveryCriteria, SnapshotExport, StoreStats, TemporalStore};
