//! # Chrysalis Orchestrator
//!
//! The stable surface of the core. Composes the adapter registry, the
//! temporal store, the shadow builder, the translation cache, the
//! compatibility matrix, and the event bus into the end-to-end operations:
//! translate, store, round-trip, batch, discover, and delete.
//!
//! Everything else in the workspace is internal but versioned; callers
//! outside the core talk to [`Orchestrator`].

#![forbid(unsafe_code)]

pub mod cache;
pub mod diff;
pub mod events;
pub mod matrix;
pub mod orchestrator;

pub use cache::{CacheStats, TranslationCache};
pub use diff::{diff_documents, DiffEntry, DiffKind};
pub use events::{Event, EventBus, EventKind, EventPrimitive, SubscriptionFilter, EVENT_SCHEMA_VERSION};
pub use matrix::{CompatibilityEntry, CompatibilityMatrix};
pub use orchestrator::{
    BatchRequest, BatchResult, GetAgentOutput, Orchestrator, RoundTripReport, TranslateOptions,
    TranslationResult,
};
