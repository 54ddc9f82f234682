//! Peer records

use serde::{Deserialize, Serialize};

use chrysalis_core::identifiers::InstanceId;

/// A known gossip peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// Peer instance id
    pub id: InstanceId,
    /// Transport endpoint
    pub endpoint: String,
    /// Whether the peer currently receives messages
    pub active: bool,
    /// Consecutive failures observed
    pub failure_count: u32,
    /// Rolling health score in [0, 1]
    pub health_score: f64,
}

impl Peer {
    /// A fresh active peer
    pub fn new(id: InstanceId, endpoint: impl Into<String>) -> Self {
        Self {
            id,
            endpoint: endpoint.into(),
            active: true,
            failure_count: 0,
            health_score: 1.0,
        }
    }

    /// Record a delivery failure; deactivates once `max_retries` is reached
    ///
    /// A deactivated peer stays inactive until it is re-added externally.
    pub fn record_failure(&mut self, max_retries: u32) {
        self.failure_count += 1;
        self.health_score = (self.health_score * 0.5).max(0.0);
        if self.failure_count >= max_retries {
            self.active = false;
        }
    }

    /// Record a successful delivery
    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.health_score = (self.health_score + 0.25).min(1.0);
    }
}
