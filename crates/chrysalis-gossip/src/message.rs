//! Gossip message and wire format

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use chrysalis_core::clock::LogicalStamp;
use chrysalis_core::errors::{ChrysalisError, Result};
use chrysalis_core::identifiers::{AgentId, InstanceId, MessageId};
use chrysalis_core::time::Timestamp;
use chrysalis_crdt::AgentSharedState;

/// Wire schema version; unknown versions are refused on receive
pub const GOSSIP_WIRE_SCHEMA_VERSION: u16 = 1;

/// Dissemination strategy of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Unsolicited state push
    Push,
    /// Request for missing state
    Pull,
    /// Periodic reconciliation
    AntiEntropy,
}

/// What a gossip message carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GossipPayload {
    /// A replica's view of one agent's shared state
    StateDelta {
        /// Agent the state belongs to
        agent_id: AgentId,
        /// The replica state to merge
        state: AgentSharedState,
    },
    /// Request for an agent's state (pull)
    StateRequest {
        /// Agent whose state is wanted
        agent_id: AgentId,
    },
    /// Liveness signal with no state
    Heartbeat,
}

/// One gossip message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GossipMessage {
    /// Unique message id (duplicate suppression key)
    pub id: MessageId,
    /// Dissemination kind
    pub kind: MessageKind,
    /// Originating instance
    pub sender: InstanceId,
    /// Wall-clock send time (age-based expiry)
    pub sent_at: Timestamp,
    /// Round counter at the sender
    pub round: u64,
    /// Hops remaining; 0 is dropped
    pub ttl: u32,
    /// Logical time at emission (causal sequencing)
    pub stamp: LogicalStamp,
    /// Carried payload
    pub payload: GossipPayload,
    /// Instances known to have seen this message
    pub seen_by: BTreeSet<InstanceId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    schema_version: u16,
    message: GossipMessage,
}

/// Encode a message for the transport
pub fn encode_wire(message: &GossipMessage) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&WireMessage {
        schema_version: GOSSIP_WIRE_SCHEMA_VERSION,
        message: message.clone(),
    })?)
}

/// Decode a wire message, refusing unknown schema versions
pub fn decode_wire(bytes: &[u8]) -> Result<GossipMessage> {
    let wire: WireMessage = serde_json::from_slice(bytes)?;
    if wire.schema_version != GOSSIP_WIRE_SCHEMA_VERSION {
        return Err(ChrysalisError::validation(format!(
            "unknown gossip wire schema version {}",
            wire.schema_version
        )));
    }
    Ok(wire.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrysalis_core::clock::VectorClock;

    fn message() -> GossipMessage {
        GossipMessage {
            id: MessageId::new(),
            kind: MessageKind::Push,
            sender: InstanceId::named("a"),
            sent_at: Timestamp::from_millis(1),
            round: 1,
            ttl: 4,
            stamp: LogicalStamp {
                lamport: 1,
                vector: VectorClock::new(),
            },
            payload: GossipPayload::Heartbeat,
            seen_by: BTreeSet::new(),
        }
    }

    #[test]
    fn wire_round_trip() {
        let original = message();
        let decoded = decode_wire(&encode_wire(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn unknown_schema_version_is_refused() {
        let mut raw: serde_json::Value =
            serde_json::from_slice(&encode_wire(&message()).unwrap()).unwrap();
        raw["schema_version"] = serde_json::json!(99);
        let err = decode_wire(&serde_json::to_vec(&raw).unwrap()).unwrap_err();
        assert!(matches!(err, ChrysalisError::Validation { .. }));
    }
}
