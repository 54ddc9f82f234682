//! Wall-clock timestamps for bi-temporal versioning
//!
//! Snapshots carry millisecond timestamps for valid-time and
//! transaction-time. Causal ordering lives in [`crate::clock`]; this module
//! is only about physical time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Current wall-clock time
    pub fn now() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(ms)
    }

    /// Construct from raw milliseconds
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Raw milliseconds since epoch
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Saturating addition of a duration
    pub fn plus(&self, d: Duration) -> Self {
        Self(self.0.saturating_add(d.as_millis() as u64))
    }

    /// Saturating subtraction of a duration
    pub fn minus(&self, d: Duration) -> Self {
        Self(self.0.saturating_sub(d.as_millis() as u64))
    }

    /// Elapsed milliseconds from `earlier` to `self` (0 if earlier is later)
    pub fn since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(ms: u64) -> Self {
        Self(ms)
    }
}
