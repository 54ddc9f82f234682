//! Merge engine: convergent state merge and Byzantine-tolerant vote
//! aggregation
//!
//! `crdt_merge` is the componentwise lattice join and always converges.
//! `byzantine_validate` aggregates numeric votes while tolerating up to
//! ⌊N/3⌋ adversarial voters: the canonical outcome is the trimmed mean
//! (top and bottom ⌊N/3⌋ dropped), and agreement requires a strict 2N/3
//! majority within ε of the median.

use serde::{Deserialize, Serialize};

use chrysalis_core::errors::{ChrysalisError, Result};

use crate::state::AgentSharedState;
use crate::Merge;

/// Merge two replicas of an agent's shared state
pub fn crdt_merge(local: &AgentSharedState, remote: &AgentSharedState) -> AgentSharedState {
    local.merge(remote)
}

/// Aggregation result over one vote set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByzantineOutcome {
    /// Untrimmed arithmetic mean
    pub mean: f64,
    /// Mean after dropping the top and bottom ⌊N/3⌋ votes
    pub trimmed_mean: f64,
    /// Median vote
    pub median: f64,
    /// Votes within ε of the median
    pub agreement_count: usize,
    /// Whether agreement exceeds the 2N/3 threshold
    pub threshold_met: bool,
    /// Number of adversarial votes tolerated (⌊N/3⌋)
    pub tolerated_faults: usize,
}

/// Aggregate votes with Byzantine tolerance
///
/// Votes must be finite and non-empty. `epsilon` bounds how far a vote may
/// sit from the median while still counting as agreement.
pub fn byzantine_validate(votes: &[f64], epsilon: f64) -> Result<ByzantineOutcome> {
    if votes.is_empty() {
        return Err(ChrysalisError::validation("empty vote set"));
    }
    if votes.iter().any(|v| !v.is_finite()) {
        return Err(ChrysalisError::validation("non-finite vote"));
    }

    let n = votes.len();
    let faults = n / 3;

    let mut sorted = votes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = sorted.iter().sum::<f64>() / n as f64;

    let trimmed = &sorted[faults..n - faults];
    let trimmed_mean = trimmed.iter().sum::<f64>() / trimmed.len() as f64;

    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    let agreement_count = sorted.iter().filter(|v| (*v - median).abs() <= epsilon).count();
    // Strict majority: agreement > 2N/3
    let threshold_met = agreement_count * 3 > 2 * n;

    Ok(ByzantineOutcome {
        mean,
        trimmed_mean,
        median,
        agreement_count,
        threshold_met,
        tolerated_faults: faults,
    })
}
