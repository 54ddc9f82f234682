//! Transport seam for gossip delivery
//!
//! Real deployments plug in a network transport; tests and single-process
//! simulations use the in-memory hub, which queues bytes per instance for
//! explicit draining.

use async_lock::RwLock;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrysalis_core::errors::{ChrysalisError, Result};
use chrysalis_core::identifiers::InstanceId;

use crate::peer::Peer;

/// Delivers encoded gossip messages to peers
#[async_trait]
pub trait GossipTransport: Send + Sync {
    /// Send bytes to a peer; unreachable peers are a `Connection` error
    async fn send(&self, peer: &Peer, bytes: Vec<u8>) -> Result<()>;
}

/// In-memory transport hub with one inbox per registered instance
#[derive(Default)]
pub struct InMemoryHub {
    inboxes: RwLock<BTreeMap<InstanceId, Vec<Vec<u8>>>>,
}

impl InMemoryHub {
    /// Empty hub
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register an instance so sends to it succeed
    pub async fn register(&self, instance: InstanceId) {
        self.inboxes.write().await.entry(instance).or_default();
    }

    /// Take everything queued for an instance
    pub async fn drain(&self, instance: &InstanceId) -> Vec<Vec<u8>> {
        self.inboxes
            .write()
            .await
            .get_mut(instance)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Number of messages queued for an instance
    pub async fn pending(&self, instance: &InstanceId) -> usize {
        self.inboxes
            .read()
            .await
            .get(instance)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl GossipTransport for InMemoryHub {
    async fn send(&self, peer: &Peer, bytes: Vec<u8>) -> Result<()> {
        let mut inboxes = self.inboxes.write().await;
        match inboxes.get_mut(&peer.id) {
            Some(inbox) => {
                inbox.push(bytes);
                Ok(())
            }
            None => Err(ChrysalisError::connection(format!(
                "peer {} is not reachable",
                peer.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_queues_and_drain_empties() {
        let hub = InMemoryHub::new();
        let id = InstanceId::named("a");
        hub.register(id.clone()).await;
        let peer = Peer::new(id.clone(), "mem://a");

        hub.send(&peer, vec![1, 2, 3]).await.unwrap();
        assert_eq!(hub.pending(&id).await, 1);
        assert_eq!(hub.drain(&id).await, vec![vec![1, 2, 3]]);
        assert_eq!(hub.pending(&id).await, 0);
    }

    #[tokio::test]
    async fn unregistered_peer_is_unreachable() {
        let hub = InMemoryHub::new();
        let peer = Peer::new(InstanceId::named("ghost"), "mem://ghost");
        let err = hub.send(&peer, vec![0]).await.unwrap_err();
        assert!(matches!(err, ChrysalisError::Connection { .. }));
    }
}
