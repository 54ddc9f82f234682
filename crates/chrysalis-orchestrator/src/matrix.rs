//! Compatibility matrix
//!
//! Running averages of fidelity per (source, target) framework pair,
//! accumulated across translations.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use chrysalis_core::identifiers::FrameworkTag;

#[derive(Debug, Clone, Copy, Default)]
struct RunningAverage {
    count: u64,
    mean: f64,
}

impl RunningAverage {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.mean += (value - self.mean) / self.count as f64;
    }
}

/// One row of the matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    /// Source framework
    pub source: FrameworkTag,
    /// Target framework
    pub target: FrameworkTag,
    /// Translations observed
    pub count: u64,
    /// Mean fidelity
    pub average_fidelity: f64,
}

/// Fidelity averages per framework pair
#[derive(Default)]
pub struct CompatibilityMatrix {
    inner: Mutex<BTreeMap<(FrameworkTag, FrameworkTag), RunningAverage>>,
}

impl CompatibilityMatrix {
    /// Empty matrix
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one translation's fidelity
    pub fn record(&self, source: &FrameworkTag, target: &FrameworkTag, fidelity: f64) {
        self.inner
            .lock()
            .entry((source.clone(), target.clone()))
            .or_default()
            .record(fidelity);
    }

    /// Average fidelity for a pair, if any translations were observed
    pub fn average(&self, source: &FrameworkTag, target: &FrameworkTag) -> Option<f64> {
        self.inner
            .lock()
            .get(&(source.clone(), target.clone()))
            .map(|avg| avg.mean)
    }

    /// Every observed pair
    pub fn entries(&self) -> Vec<CompatibilityEntry> {
        self.inner
            .lock()
            .iter()
            .map(|((source, target), avg)| CompatibilityEntry {
                source: source.clone(),
                target: target.clone(),
                count: avg.count,
                average_fidelity: avg.mean,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_average_accumulates() {
        let matrix = CompatibilityMatrix::new();
        let usa = FrameworkTag::new("usa");
        let lmos = FrameworkTag::new("lmos");
        matrix.record(&usa, &lmos, 0.8);
        matrix.record(&usa, &lmos, 1.0);
        let avg = matrix.average(&usa, &lmos).unwrap();
        assert!((avg - 0.9).abs() < 1e-9);
        assert_eq!(matrix.entries().len(), 1);
        assert_eq!(matrix.entries()[0].count, 2);
    }

    #[test]
    fn pairs_are_directional() {
        let matrix = CompatibilityMatrix::new();
        let usa = FrameworkTag::new("usa");
        let lmos = FrameworkTag::new("lmos");
        matrix.record(&usa, &lmos, 0.9);
        assert!(matrix.average(&lmos, &usa).is_none());
    }
}
