//! Workspace configuration
//!
//! One struct covers the recognized options; nested sections mirror the
//! subsystems. `validate()` accumulates every issue rather than failing on
//! the first, so a bad config file reports all problems at once.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::MIN_PBKDF2_ITERATIONS;

/// Top-level configuration for the Chrysalis core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChrysalisConfig {
    /// Enable the orchestrator translation cache
    pub enable_cache: bool,
    /// Fidelity threshold below which a translation emits a warning
    pub min_fidelity_score: f64,
    /// Snapshot the source canonical on every translation
    pub auto_persist: bool,
    /// Gossip protocol options
    pub gossip: GossipConfig,
    /// Crypto options
    pub crypto: CryptoConfig,
    /// Adapter registry options
    pub adapters: AdapterConfig,
    /// Event bus options
    pub event_bus: EventBusConfig,
    /// Translation cache options
    pub cache: CacheConfig,
}

impl Default for ChrysalisConfig {
    fn default() -> Self {
        Self {
            enable_cache: true,
            min_fidelity_score: 0.9,
            auto_persist: false,
            gossip: GossipConfig::default(),
            crypto: CryptoConfig::default(),
            adapters: AdapterConfig::default(),
            event_bus: EventBusConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Gossip protocol options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GossipConfig {
    /// Peers contacted per broadcast hop
    pub fanout: usize,
    /// Failures before a peer is deactivated
    pub max_retries: u32,
    /// Initial TTL on outgoing messages
    pub message_ttl: u32,
    /// Maximum message age in milliseconds before drop
    pub max_age_ms: u64,
    /// Bounded seen-cache capacity
    pub seen_cache_size: usize,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            fanout: 3,
            max_retries: 3,
            message_ttl: 8,
            max_age_ms: 60_000,
            seen_cache_size: 10_000,
        }
    }
}

/// Crypto options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2 iteration count (floor 100 000)
    pub pbkdf2_iterations: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: MIN_PBKDF2_ITERATIONS,
        }
    }
}

/// Adapter registry options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Interval between adapter health checks, milliseconds
    pub health_check_interval_ms: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            health_check_interval_ms: 30_000,
        }
    }
}

/// Event bus options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Bounded history capacity (FIFO eviction)
    pub max_history_size: usize,
    /// Per-subscriber delivery queue capacity
    pub subscriber_queue_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_history_size: 1_000,
            subscriber_queue_size: 256,
        }
    }
}

/// Translation cache options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached translations (LRU eviction)
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 512 }
    }
}

/// A single configuration problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted field path of the offending option
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ChrysalisConfig {
    /// Validate all options, accumulating every issue
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        if !(0.0..=1.0).contains(&self.min_fidelity_score) {
            issues.push(ValidationIssue {
                field: "min_fidelity_score".into(),
                message: format!("must be in [0, 1], got {}", self.min_fidelity_score),
            });
        }
        if self.gossip.fanout == 0 {
            issues.push(ValidationIssue {
                field: "gossip.fanout".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.gossip.message_ttl == 0 {
            issues.push(ValidationIssue {
                field: "gossip.message_ttl".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.gossip.seen_cache_size == 0 {
            issues.push(ValidationIssue {
                field: "gossip.seen_cache_size".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.crypto.pbkdf2_iterations < MIN_PBKDF2_ITERATIONS {
            issues.push(ValidationIssue {
                field: "crypto.pbkdf2_iterations".into(),
                message: format!(
                    "must be at least {}, got {}",
                    MIN_PBKDF2_ITERATIONS, self.crypto.pbkdf2_iterations
                ),
            });
        }
        if self.event_bus.max_history_size == 0 {
            issues.push(ValidationIssue {
                field: "event_bus.max_history_size".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.cache.max_entries == 0 && self.enable_cache {
            issues.push(ValidationIssue {
                field: "cache.max_entries".into(),
                message: "must be at least 1 when the cache is enabled".into(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}
