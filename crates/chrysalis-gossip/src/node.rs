//! The gossip node
//!
//! Holds the peer set, the bounded seen-cache, the instance clock, and the
//! replicated agent states. Receiving applies the payload at most once per
//! message id and re-forwards to peers not yet in the message's `seen_by`
//! set.

use async_lock::{Mutex, RwLock};
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use chrysalis_core::clock::InstanceClock;
use chrysalis_core::config::GossipConfig;
use chrysalis_core::errors::{ChrysalisError, Result};
use chrysalis_core::identifiers::{AgentId, InstanceId, MessageId};
use chrysalis_core::time::Timestamp;
use chrysalis_crdt::{AgentSharedState, Merge};

use crate::message::{decode_wire, encode_wire, GossipMessage, GossipPayload, MessageKind};
use crate::peer::Peer;
use crate::transport::GossipTransport;

/// Drop and delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GossipStats {
    /// Messages sent to peers
    pub sent: u64,
    /// Messages applied
    pub applied: u64,
    /// Duplicates dropped via the seen-cache
    pub duplicate_dropped: u64,
    /// Messages dropped with TTL 0
    pub expired_dropped: u64,
    /// Messages dropped past the age limit
    pub stale_dropped: u64,
}

/// What happened to a received message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Payload applied and message re-forwarded
    Applied,
    /// Already seen; payload not applied again
    DuplicateDropped,
    /// TTL exhausted
    ExpiredDropped,
    /// Older than the configured maximum age
    StaleDropped,
}

struct SeenCache {
    order: VecDeque<MessageId>,
    members: BTreeSet<MessageId>,
    capacity: usize,
}

impl SeenCache {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            members: BTreeSet::new(),
            capacity,
        }
    }

    fn contains(&self, id: &MessageId) -> bool {
        self.members.contains(id)
    }

    fn insert(&mut self, id: MessageId) {
        if self.members.insert(id) {
            self.order.push_back(id);
            while self.order.len() > self.capacity {
                if let Some(evicted) = self.order.pop_front() {
                    self.members.remove(&evicted);
                }
            }
        }
    }
}

/// One instance's gossip endpoint
pub struct GossipNode {
    instance: InstanceId,
    config: GossipConfig,
    clock: Mutex<InstanceClock>,
    peers: RwLock<BTreeMap<InstanceId, Peer>>,
    seen: RwLock<SeenCache>,
    states: RwLock<BTreeMap<AgentId, AgentSharedState>>,
    stats: RwLock<GossipStats>,
    round: AtomicU64,
    transport: Arc<dyn GossipTransport>,
    disposed: AtomicBool,
}

impl GossipNode {
    /// Create a node for an instance
    pub fn new(
        instance: InstanceId,
        config: GossipConfig,
        transport: Arc<dyn GossipTransport>,
    ) -> Self {
        let seen = SeenCache::new(config.seen_cache_size);
        Self {
            clock: Mutex::new(InstanceClock::new(instance.clone())),
            instance,
            config,
            peers: RwLock::new(BTreeMap::new()),
            seen: RwLock::new(seen),
            states: RwLock::new(BTreeMap::new()),
            stats: RwLock::new(GossipStats::default()),
            round: AtomicU64::new(0),
            transport,
            disposed: AtomicBool::new(false),
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(ChrysalisError::disposed("gossip node"));
        }
        Ok(())
    }

    /// This node's instance id
    pub fn instance(&self) -> &InstanceId {
        &self.instance
    }

    /// Release the node; later calls fail with `Disposed`
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    /// Add or reactivate a peer
    pub async fn add_peer(&self, peer: Peer) -> Result<()> {
        self.ensure_live()?;
        self.peers.write().await.insert(peer.id.clone(), peer);
        Ok(())
    }

    /// Remove a peer entirely
    pub async fn remove_peer(&self, id: &InstanceId) -> Result<bool> {
        self.ensure_live()?;
        Ok(self.peers.write().await.remove(id).is_some())
    }

    /// Record a delivery failure against a peer
    ///
    /// The peer deactivates once `max_retries` consecutive failures
    /// accumulate; it stays inactive until re-added.
    pub async fn mark_peer_failed(&self, id: &InstanceId) -> Result<()> {
        self.ensure_live()?;
        if let Some(peer) = self.peers.write().await.get_mut(id) {
            peer.record_failure(self.config.max_retries);
            if !peer.active {
                debug!(peer = %id, "peer deactivated after repeated failures");
            }
        }
        Ok(())
    }

    /// Up to `fanout` random active peers, excluding the given set
    pub async fn select_random_peers(&self, exclude: &BTreeSet<InstanceId>) -> Vec<Peer> {
        let peers = self.peers.read().await;
        let mut candidates: Vec<Peer> = peers
            .values()
            .filter(|p| p.active && !exclude.contains(&p.id))
            .cloned()
            .collect();
        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(self.config.fanout);
        candidates
    }

    /// Expected rounds to reach `n` instances at the configured fanout
    pub fn expected_rounds(&self, instances: usize) -> u32 {
        if instances <= 1 || self.config.fanout <= 1 {
            return instances.max(1) as u32;
        }
        (instances as f64).log(self.config.fanout as f64).ceil() as u32
    }

    /// Originate a message and push it to `fanout` peers
    pub async fn broadcast(&self, kind: MessageKind, payload: GossipPayload) -> Result<GossipMessage> {
        self.ensure_live()?;
        let stamp = self.clock.lock().await.tick();
        let round = self.round.fetch_add(1, Ordering::SeqCst) + 1;

        let mut seen_by = BTreeSet::new();
        seen_by.insert(self.instance.clone());
        let message = GossipMessage {
            id: MessageId::new(),
            kind,
            sender: self.instance.clone(),
            sent_at: Timestamp::now(),
            round,
            ttl: self.config.message_ttl,
            stamp,
            payload,
            seen_by,
        };

        self.seen.write().await.insert(message.id);
        self.apply(&message).await;
        self.forward(&message).await?;
        Ok(message)
    }

    /// Handle bytes from the transport
    pub async fn receive(&self, bytes: &[u8]) -> Result<ReceiveOutcome> {
        self.ensure_live()?;
        let message = decode_wire(bytes)?;

        {
            let seen = self.seen.read().await;
            if seen.contains(&message.id) {
                self.stats.write().await.duplicate_dropped += 1;
                trace!(id = %message.id, "duplicate dropped");
                return Ok(ReceiveOutcome::DuplicateDropped);
            }
        }
        if message.ttl == 0 {
            self.stats.write().await.expired_dropped += 1;
            return Ok(ReceiveOutcome::ExpiredDropped);
        }
        if Timestamp::now().since(message.sent_at) > self.config.max_age_ms {
            self.stats.write().await.stale_dropped += 1;
            return Ok(ReceiveOutcome::StaleDropped);
        }

        self.seen.write().await.insert(message.id);
        self.clock.lock().await.observe(&message.stamp);
        self.apply(&message).await;
        self.stats.write().await.applied += 1;

        let mut forwarded = message.clone();
        forwarded.ttl -= 1;
        forwarded.seen_by.insert(self.instance.clone());
        if forwarded.ttl > 0 {
            self.forward(&forwarded).await?;
        }

        // Answer pulls with a push of the requested state
        if let GossipPayload::StateRequest { agent_id } = &message.payload {
            if let Some(state) = self.state_of(agent_id).await {
                self.broadcast(
                    MessageKind::Push,
                    GossipPayload::StateDelta {
                        agent_id: agent_id.clone(),
                        state,
                    },
                )
                .await?;
            }
        }
        Ok(ReceiveOutcome::Applied)
    }

    async fn apply(&self, message: &GossipMessage) {
        if let GossipPayload::StateDelta { agent_id, state } = &message.payload {
            let mut states = self.states.write().await;
            match states.get_mut(agent_id) {
                Some(existing) => *existing = existing.merge(state),
                None => {
                    states.insert(agent_id.clone(), state.clone());
                }
            }
        }
    }

    /// Record a local state update and push it to peers
    pub async fn update_state(&self, state: AgentSharedState) -> Result<GossipMessage> {
        self.broadcast(
            MessageKind::Push,
            GossipPayload::StateDelta {
                agent_id: state.agent_id.clone(),
                state,
            },
        )
        .await
    }

    /// Ask the cluster for an agent's state (pull)
    ///
    /// Holders reply with a push of their merged state; the reply converges
    /// back to this node through normal dissemination.
    pub async fn request_state(&self, agent_id: &AgentId) -> Result<GossipMessage> {
        self.broadcast(
            MessageKind::Pull,
            GossipPayload::StateRequest {
                agent_id: agent_id.clone(),
            },
        )
        .await
    }

    /// Push every locally held agent state to peers (periodic reconciliation)
    ///
    /// Returns the number of states pushed.
    pub async fn run_anti_entropy(&self) -> Result<usize> {
        self.ensure_live()?;
        let snapshot: Vec<AgentSharedState> =
            self.states.read().await.values().cloned().collect();
        let count = snapshot.len();
        for state in snapshot {
            self.broadcast(
                MessageKind::AntiEntropy,
                GossipPayload::StateDelta {
                    agent_id: state.agent_id.clone(),
                    state,
                },
            )
            .await?;
        }
        Ok(count)
    }

    async fn forward(&self, message: &GossipMessage) -> Result<()> {
        let targets = self.select_random_peers(&message.seen_by).await;
        if targets.is_empty() {
            return Ok(());
        }
        let bytes = encode_wire(message)?;
        for peer in targets {
            match self.transport.send(&peer, bytes.clone()).await {
                Ok(()) => {
                    self.stats.write().await.sent += 1;
                    if let Some(p) = self.peers.write().await.get_mut(&peer.id) {
                        p.record_success();
                    }
                }
                Err(_) => {
                    self.mark_peer_failed(&peer.id).await?;
                }
            }
        }
        Ok(())
    }

    /// The merged state this node holds for an agent
    pub async fn state_of(&self, agent_id: &AgentId) -> Option<AgentSharedState> {
        self.states.read().await.get(agent_id).cloned()
    }

    /// Whether a message id is in the seen-cache
    pub async fn has_seen(&self, id: &MessageId) -> bool {
        self.seen.read().await.contains(id)
    }

    /// Drop and delivery counters
    pub async fn stats(&self) -> GossipStats {
        *self.stats.read().await
    }

    /// Active peer count
    pub async fn active_peer_count(&self) -> usize {
        self.peers.read().await.values().filter(|p| p.active).count()
    }
}
