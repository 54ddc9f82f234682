//! The adapter contract
//!
//! Every concrete adapter translates in both directions, validates native
//! input before translation, and declares its field mappings so the
//! fidelity scorer and diagnostics can reason about them without running a
//! translation.

use serde::{Deserialize, Serialize};

use chrysalis_core::errors::Result;
use chrysalis_core::identifiers::FrameworkTag;
use chrysalis_core::model::{CanonicalAgent, NativeAgent};

use crate::fidelity::FieldImportance;

/// Declarative description of one source-path → predicate mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Dotted path in the native document
    pub source_path: String,
    /// Canonical predicate IRI the field maps to
    pub predicate: String,
    /// Weight class for the fidelity scorer
    pub importance: FieldImportance,
}

impl FieldMapping {
    /// Construct a mapping
    pub fn new(
        source_path: impl Into<String>,
        predicate: impl Into<String>,
        importance: FieldImportance,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            predicate: predicate.into(),
            importance,
        }
    }
}

/// Issue severity in a validation report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Fails validation
    Error,
    /// Passes validation with a note
    Warning,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Severity
    pub severity: Severity,
    /// Machine-readable code (`missing-field`, `bad-type`, ...)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Dotted path of the offending field
    pub field_path: String,
}

impl ValidationIssue {
    /// An error-severity issue
    pub fn error(code: &str, message: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            message: message.into(),
            field_path: field_path.into(),
        }
    }

    /// A warning-severity issue
    pub fn warning(code: &str, message: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
            field_path: field_path.into(),
        }
    }
}

/// Outcome of a pre-translation structural check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Findings, errors first is not guaranteed
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Report with no findings
    pub fn clean() -> Self {
        Self { issues: Vec::new() }
    }

    /// Whether no error-severity issues exist
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Error-severity issues
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Warning-severity issues
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

/// Bidirectional translator between one framework and the canonical model
pub trait AgentAdapter: Send + Sync + std::fmt::Debug {
    /// Framework tag this adapter serves
    fn framework(&self) -> FrameworkTag;

    /// Human-readable adapter name
    fn name(&self) -> &'static str;

    /// Adapter version
    fn version(&self) -> &'static str;

    /// Extension namespace owned by this adapter
    fn extension_namespace(&self) -> &'static str;

    /// Whether shadow envelopes may be embedded in this framework's shape
    fn supports_shadow(&self) -> bool {
        true
    }

    /// Document key where a shadow envelope attaches
    fn shadow_attachment_path(&self) -> &'static str {
        crate::SHADOW_KEY
    }

    /// Structural check before translation
    fn validate_native(&self, native: &NativeAgent) -> ValidationReport;

    /// Translate a native document into the canonical model
    fn to_canonical(&self, native: &NativeAgent) -> Result<CanonicalAgent>;

    /// Reconstruct a native document from the canonical model
    ///
    /// Extensions in this adapter's namespace are restored to their
    /// original source paths; foreign-namespace extensions are carried
    /// under the reserved `_extensions` key.
    fn from_canonical(&self, canonical: &CanonicalAgent) -> Result<NativeAgent>;

    /// Declared source-path → predicate mappings
    fn field_mappings(&self) -> Vec<FieldMapping>;

    /// Fields of a native document this adapter cannot map
    ///
    /// Used by the shadow builder; keys are dotted source paths.
    fn nonmappable(&self, native: &NativeAgent) -> Result<serde_json::Map<String, serde_json::Value>>;
}

/// A cross-framework field equivalence derived from shared predicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticEquivalence {
    /// Canonical predicate both fields map to
    pub predicate: String,
    /// Path in the first framework
    pub left_path: String,
    /// Path in the second framework
    pub right_path: String,
}

/// Join two adapters' field mappings on their canonical predicate
///
/// Two native fields are semantically equivalent exactly when they map to
/// the same ontology predicate.
pub fn cross_framework_equivalences(
    left: &dyn AgentAdapter,
    right: &dyn AgentAdapter,
) -> Vec<SemanticEquivalence> {
    let right_mappings = right.field_mappings();
    let mut out = Vec::new();
    for lm in left.field_mappings() {
        for rm in right_mappings.iter().filter(|rm| rm.predicate == lm.predicate) {
            out.push(SemanticEquivalence {
                predicate: lm.predicate.clone(),
                left_path: lm.source_path.clone(),
                right_path: rm.source_path.clone(),
            });
        }
    }
    out
}
