//! Fidelity scoring
//!
//! The score is a property of one translation: the weighted share of
//! source fields that made it onto ontology quads. Core identity fields
//! (name, role, goal, LLM provider and model) weigh more than peripheral
//! metadata. The weighting table is versioned so consumers can detect
//! scoring changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::adapter::FieldMapping;

/// Version of the field weighting scheme
pub const WEIGHT_TABLE_VERSION: u32 = 1;

/// Weight class of a source field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldImportance {
    /// Peripheral metadata (weight 1)
    Peripheral,
    /// Capabilities, memory, bindings (weight 2)
    Standard,
    /// Identity-defining fields: name, role, goal, LLM provider/model (weight 3)
    Core,
}

impl FieldImportance {
    /// Numeric weight
    pub fn weight(&self) -> u32 {
        match self {
            FieldImportance::Peripheral => 1,
            FieldImportance::Standard => 2,
            FieldImportance::Core => 3,
        }
    }
}

/// Weighted scorer built from an adapter's declared mappings
///
/// Paths without a declared mapping (extension and lost fields) weigh
/// `Peripheral`.
#[derive(Debug, Clone)]
pub struct FidelityScorer {
    weights: BTreeMap<String, FieldImportance>,
}

impl FidelityScorer {
    /// Build a scorer from declared field mappings
    pub fn from_mappings(mappings: &[FieldMapping]) -> Self {
        Self {
            weights: mappings
                .iter()
                .map(|m| (m.source_path.clone(), m.importance))
                .collect(),
        }
    }

    /// Weight of a source path
    ///
    /// Exact match first, then the longest declared prefix (so
    /// `capabilities.tools.0.name` inherits the weight declared for
    /// `capabilities.tools`). Undeclared paths weigh `Peripheral`.
    pub fn weight_of(&self, path: &str) -> u32 {
        if let Some(importance) = self.weights.get(path) {
            return importance.weight();
        }
        self.weights
            .iter()
            .filter(|(declared, _)| path.starts_with(&format!("{}.", declared)))
            .max_by_key(|(declared, _)| declared.len())
            .map(|(_, importance)| importance.weight())
            .unwrap_or(FieldImportance::Peripheral.weight())
    }

    /// Weighted fidelity over the three tracking buckets
    ///
    /// `sum(w(mapped)) / sum(w(mapped ∪ unmapped ∪ lost))`; a translation
    /// that observed no fields scores 1.0.
    pub fn score(&self, mapped: &[String], unmapped: &[String], lost: &[String]) -> f64 {
        let mapped_weight: u32 = mapped.iter().map(|p| self.weight_of(p)).sum();
        let total_weight: u32 = mapped_weight
            + unmapped.iter().map(|p| self.weight_of(p)).sum::<u32>()
            + lost.iter().map(|p| self.weight_of(p)).sum::<u32>();
        if total_weight == 0 {
            return 1.0;
        }
        f64::from(mapped_weight) / f64::from(total_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> FidelityScorer {
        FidelityScorer::from_mappings(&[
            FieldMapping::new("metadata.name", "p:name", FieldImportance::Core),
            FieldMapping::new("capabilities.tools", "p:tool", FieldImportance::Standard),
            FieldMapping::new("metadata.author", "p:author", FieldImportance::Peripheral),
        ])
    }

    #[test]
    fn all_mapped_scores_one() {
        let s = scorer();
        let mapped = vec!["metadata.name".to_string(), "metadata.author".to_string()];
        assert_eq!(s.score(&mapped, &[], &[]), 1.0);
    }

    #[test]
    fn core_fields_dominate_the_score() {
        let s = scorer();
        // Core mapped, peripheral lost: 3 / 4
        let high = s.score(
            &["metadata.name".to_string()],
            &[],
            &["metadata.author".to_string()],
        );
        // Peripheral mapped, core lost: 1 / 4
        let low = s.score(
            &["metadata.author".to_string()],
            &[],
            &["metadata.name".to_string()],
        );
        assert!(high > low);
        assert!((high - 0.75).abs() < f64::EPSILON);
        assert!((low - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_paths_weigh_peripheral() {
        let s = scorer();
        assert_eq!(s.weight_of("some.unknown.path"), 1);
    }

    #[test]
    fn indexed_paths_inherit_prefix_weight() {
        let s = scorer();
        assert_eq!(s.weight_of("capabilities.tools.0.name"), 2);
        assert_eq!(s.weight_of("capabilities.toolsmith"), 1);
    }

    #[test]
    fn empty_translation_scores_one() {
        assert_eq!(scorer().score(&[], &[], &[]), 1.0);
    }

    #[test]
    fn published_weight_table_is_versioned() {
        assert_eq!(WEIGHT_TABLE_VERSION, 1);
        assert_eq!(FieldImportance::Core.weight(), 3);
        assert_eq!(FieldImportance::Standard.weight(), 2);
        assert_eq!(FieldImportance::Peripheral.weight(), 1);
    }
}
