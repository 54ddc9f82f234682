//! Adapter registry with health tracking
//!
//! Read-mostly: lookups take a read lock, registration and health updates
//! take the write lock. A `Down` adapter refuses to serve; `Degraded`
//! serves but the caller should surface a warning.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use chrysalis_core::errors::{ChrysalisError, Result};
use chrysalis_core::identifiers::FrameworkTag;
use chrysalis_core::time::Timestamp;

use crate::adapter::AgentAdapter;

/// Health of a registered adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Serving normally
    Healthy,
    /// Serving with warnings
    Degraded,
    /// Not serving
    Down,
}

struct Registration {
    adapter: Arc<dyn AgentAdapter>,
    health: HealthStatus,
    last_checked: Timestamp,
}

/// Registry of adapters indexed by framework tag
pub struct AdapterRegistry {
    inner: RwLock<BTreeMap<FrameworkTag, Registration>>,
}

impl AdapterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register an adapter under its framework tag
    ///
    /// Re-registering a tag replaces the previous adapter.
    pub fn register(&self, adapter: Arc<dyn AgentAdapter>) {
        let tag = adapter.framework();
        self.inner.write().insert(
            tag,
            Registration {
                adapter,
                health: HealthStatus::Healthy,
                last_checked: Timestamp::now(),
            },
        );
    }

    /// Remove an adapter; returns whether it existed
    pub fn unregister(&self, tag: &FrameworkTag) -> bool {
        self.inner.write().remove(tag).is_some()
    }

    /// Look up a serving adapter
    ///
    /// Missing tags are a configuration error; `Down` adapters refuse.
    /// Returns the adapter together with its health so callers can emit a
    /// warning for degraded service.
    pub fn get(&self, tag: &FrameworkTag) -> Result<(Arc<dyn AgentAdapter>, HealthStatus)> {
        let inner = self.inner.read();
        let registration = inner.get(tag).ok_or_else(|| {
            ChrysalisError::configuration(format!("no adapter registered for framework '{}'", tag))
        })?;
        if registration.health == HealthStatus::Down {
            return Err(ChrysalisError::configuration(format!(
                "adapter for framework '{}' is down",
                tag
            )));
        }
        if registration.health == HealthStatus::Degraded {
            warn!(framework = %tag, "serving from degraded adapter");
        }
        Ok((registration.adapter.clone(), registration.health))
    }

    /// Current health of a framework's adapter
    pub fn health(&self, tag: &FrameworkTag) -> Option<HealthStatus> {
        self.inner.read().get(tag).map(|r| r.health)
    }

    /// When a framework's adapter was last health-checked
    pub fn last_checked(&self, tag: &FrameworkTag) -> Option<Timestamp> {
        self.inner.read().get(tag).map(|r| r.last_checked)
    }

    /// Set health explicitly (operational override)
    pub fn set_health(&self, tag: &FrameworkTag, health: HealthStatus) -> bool {
        let mut inner = self.inner.write();
        match inner.get_mut(tag) {
            Some(registration) => {
                registration.health = health;
                registration.last_checked = Timestamp::now();
                true
            }
            None => false,
        }
    }

    /// Run a structural health check over every adapter
    ///
    /// An adapter with no declared field mappings or an empty extension
    /// namespace is marked `Degraded`.
    pub fn run_health_checks(&self) {
        let mut inner = self.inner.write();
        for registration in inner.values_mut() {
            let adapter = &registration.adapter;
            let healthy =
                !adapter.field_mappings().is_empty() && !adapter.extension_namespace().is_empty();
            registration.health = if healthy {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            };
            registration.last_checked = Timestamp::now();
        }
    }

    /// Registered framework tags
    pub fn frameworks(&self) -> Vec<FrameworkTag> {
        self.inner.read().keys().cloned().collect()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
