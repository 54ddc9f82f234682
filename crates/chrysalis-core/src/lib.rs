//! # Chrysalis Core
//!
//! Foundation crate for the Chrysalis agent morphing system. Provides the
//! framework-neutral canonical agent model, the crypto primitives behind
//! content addressing and shadow envelopes, logical clocks for the
//! distributed state layer, and the shared error taxonomy and configuration
//! used by every other crate in the workspace.
//!
//! This crate has zero dependencies on other Chrysalis crates. Everything in
//! it is pure and synchronous: hashing, key derivation, term construction,
//! serialization, and clock arithmetic are deterministic operations with no
//! I/O. Async boundaries live in the store, gossip, and orchestrator crates.

#![forbid(unsafe_code)]

pub mod cancel;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod identifiers;
pub mod model;
pub mod time;
pub mod util;

pub use cancel::CancelToken;
pub use clock::{ClockOrdering, InstanceClock, LamportClock, VectorClock};
pub use config::ChrysalisConfig;
pub use crypto::{Hash32, Key32};
pub use errors::{ChrysalisError, ErrorContext, Result};
pub use identifiers::{AgentId, CorrelationId, EventId, FrameworkTag, InstanceId, MessageId};
pub use model::{
    CanonicalAgent, ExtensionProperty, GraphName, Literal, NativeAgent, Quad, Subject, Term,
    TranslationMetadata,
};
pub use time::Timestamp;
