//! Event bus
//!
//! Every materialized orchestrator operation emits a structured event.
//! Delivery is FIFO per subscriber over a bounded queue; history is a
//! bounded deque with FIFO eviction. The core never depends on the bus:
//! translation runs identically with zero subscribers.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::trace;

use chrysalis_core::config::EventBusConfig;
use chrysalis_core::identifiers::{CorrelationId, EventId};
use chrysalis_core::time::Timestamp;

/// Event schema version; any payload change bumps this
pub const EVENT_SCHEMA_VERSION: u16 = 1;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A native agent was parsed into the canonical model
    AgentIngested,
    /// A translation completed
    AgentTranslated,
    /// A snapshot was persisted
    AgentStored,
    /// An agent's history was deleted
    AgentDeleted,
}

impl EventKind {
    /// Primitive category of the event
    pub fn primitive(&self) -> EventPrimitive {
        match self {
            EventKind::AgentIngested | EventKind::AgentDeleted => EventPrimitive::Agent,
            EventKind::AgentTranslated => EventPrimitive::Translation,
            EventKind::AgentStored => EventPrimitive::Storage,
        }
    }
}

/// Coarse event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPrimitive {
    /// Agent lifecycle
    Agent,
    /// Translation pipeline
    Translation,
    /// Persistence
    Storage,
}

/// A structured event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event id
    pub id: EventId,
    /// What happened
    pub kind: EventKind,
    /// Coarse category
    pub primitive: EventPrimitive,
    /// When it happened
    pub timestamp: Timestamp,
    /// Operation the event belongs to
    pub correlation_id: CorrelationId,
    /// Kind-specific payload
    pub payload: serde_json::Value,
    /// Schema version of the payload
    pub schema_version: u16,
}

impl Event {
    /// Build an event for a kind and payload
    pub fn new(kind: EventKind, correlation_id: CorrelationId, payload: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            primitive: kind.primitive(),
            kind,
            timestamp: Timestamp::now(),
            correlation_id,
            payload,
            schema_version: EVENT_SCHEMA_VERSION,
        }
    }
}

/// What a subscriber wants to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionFilter {
    /// Everything (the `*` subscription)
    All,
    /// One event kind
    Kind(EventKind),
}

impl SubscriptionFilter {
    fn matches(&self, event: &Event) -> bool {
        match self {
            SubscriptionFilter::All => true,
            SubscriptionFilter::Kind(kind) => event.kind == *kind,
        }
    }
}

struct Subscriber {
    filter: SubscriptionFilter,
    sender: mpsc::Sender<Event>,
}

/// Bounded-history event bus with per-subscriber FIFO delivery
pub struct EventBus {
    config: EventBusConfig,
    history: Mutex<VecDeque<Event>>,
    subscribers: Mutex<Vec<Subscriber>>,
    disposed: AtomicBool,
}

impl EventBus {
    /// Create a bus
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            config,
            history: Mutex::new(VecDeque::new()),
            subscribers: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Subscribe with a filter; the receiver yields matching events FIFO
    ///
    /// A subscriber that falls behind its queue capacity loses the newest
    /// events rather than blocking publishers.
    pub fn subscribe(&self, filter: SubscriptionFilter) -> mpsc::Receiver<Event> {
        let (sender, receiver) = mpsc::channel(self.config.subscriber_queue_size);
        self.subscribers.lock().push(Subscriber { filter, sender });
        receiver
    }

    /// Publish an event to history and all matching subscribers
    pub fn publish(&self, event: Event) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        trace!(kind = ?event.kind, correlation = %event.correlation_id, "event published");

        {
            let mut history = self.history.lock();
            history.push_back(event.clone());
            while history.len() > self.config.max_history_size {
                history.pop_front();
            }
        }

        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|subscriber| {
            if !subscriber.filter.matches(&event) {
                return !subscriber.sender.is_closed();
            }
            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }

    /// Most recent events, oldest first, up to `limit`
    pub fn history(&self, limit: usize) -> Vec<Event> {
        let history = self.history.lock();
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    /// Stop publishing; later publishes are silently dropped
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.subscribers.lock().clear();
    }
}
