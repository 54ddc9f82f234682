//! # Chrysalis CRDT Kit
//!
//! Conflict-free replicated data types backing the distributed state layer:
//! grow-only sets, observed-remove sets, and last-writer-wins registers and
//! maps, plus the merge engine that combines replicated agent state and
//! aggregates votes under Byzantine assumptions.
//!
//! Every type implements [`Merge`]; merge is commutative, associative, and
//! idempotent (property-tested in `tests/crdt_properties.rs`), so replicas
//! converge regardless of delivery order.

#![forbid(unsafe_code)]

pub mod engine;
pub mod gset;
pub mod lww;
pub mod orset;
pub mod state;

pub use engine::{byzantine_validate, crdt_merge, ByzantineOutcome};
pub use gset::GSet;
pub use lww::{LwwMap, LwwRegister};
pub use orset::OrSet;
pub use state::AgentSharedState;

/// Lattice join for replicated state
///
/// Implementations must be commutative, associative, and idempotent.
pub trait Merge {
    /// Join two replica states into their least upper bound
    fn merge(&self, other: &Self) -> Self;
}
