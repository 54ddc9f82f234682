//! # Chrysalis Gossip
//!
//! Epidemic dissemination of replicated agent state: each instance pushes
//! updates to `fanout` random active peers, receivers deduplicate against
//! a bounded seen-cache, decrement the TTL, and re-forward to peers that
//! have not seen the message. Payloads carry Lamport and vector clocks so
//! the merge layer can sequence causally related updates.
//!
//! The transport is a seam ([`transport::GossipTransport`]); an in-memory
//! hub ships for tests and single-process simulation.

#![forbid(unsafe_code)]

pub mod message;
pub mod node;
pub mod peer;
pub mod transport;

pub use message::{
    decode_wire, encode_wire, GossipMessage, GossipPayload, MessageKind, GOSSIP_WIRE_SCHEMA_VERSION,
};
pub use node::{GossipNode, GossipStats, ReceiveOutcome};
pub use peer::Peer;
pub use transport::{GossipTransport, InMemoryHub};
