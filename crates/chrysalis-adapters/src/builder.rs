//! Canonical graph builder with field tracking
//!
//! Adapters build their quads through this helper so every source path
//! lands in exactly one of the three tracking buckets: mapped (has a
//! quad), unmapped (has an extension), or lost (has a warning). `finish`
//! computes the fidelity score and assembles the translation metadata.

use serde_json::Value;
use std::collections::BTreeSet;

use chrysalis_core::errors::Result;
use chrysalis_core::model::{
    ExtensionProperty, GraphName, Literal, Quad, Subject, Term, TranslationMetadata,
};
use chrysalis_core::time::Timestamp;
use chrysalis_core::util::canonical_json_string;

use crate::fidelity::FidelityScorer;

/// Accumulates quads, extensions, and tracking state for one translation
#[derive(Debug)]
pub struct CanonicalBuilder {
    quads: Vec<Quad>,
    mapped: BTreeSet<String>,
    unmapped: BTreeSet<String>,
    lost: BTreeSet<String>,
    warnings: Vec<String>,
    extensions: Vec<ExtensionProperty>,
    blank_counter: u32,
}

impl CanonicalBuilder {
    /// Fresh builder
    pub fn new() -> Self {
        Self {
            quads: Vec::new(),
            mapped: BTreeSet::new(),
            unmapped: BTreeSet::new(),
            lost: BTreeSet::new(),
            warnings: Vec::new(),
            extensions: Vec::new(),
            blank_counter: 0,
        }
    }

    /// Record a quad and mark its source path mapped
    pub fn add_quad_tracked(
        &mut self,
        subject: Subject,
        predicate: impl Into<String>,
        object: Term,
        source_path: impl Into<String>,
    ) {
        self.quads.push(Quad::new(subject, predicate, object));
        self.mapped.insert(source_path.into());
    }

    /// Record a quad without touching field tracking
    ///
    /// For structural quads (rdf:type, links between nodes) that do not
    /// correspond to a single source field.
    pub fn add_quad(&mut self, subject: Subject, predicate: impl Into<String>, object: Term) {
        self.quads.push(Quad::new(subject, predicate, object));
    }

    /// Map a scalar JSON value to a literal quad, skipping absent values
    ///
    /// `None`, JSON null, and empty strings produce no quad and no
    /// tracking entry. Numbers map to `xsd:double` or `xsd:integer`,
    /// booleans to `xsd:boolean`.
    pub fn add_optional_literal(
        &mut self,
        subject: &Subject,
        predicate: &str,
        value: Option<&Value>,
        source_path: &str,
    ) {
        let Some(value) = value else {
            return;
        };
        let literal = match value {
            Value::Null => return,
            Value::String(s) if s.is_empty() => return,
            Value::String(s) => Literal::string(s.clone()),
            Value::Bool(b) => Literal::boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Literal::integer(i)
                } else {
                    Literal::double(n.as_f64().unwrap_or(0.0))
                }
            }
            // Containers go through add_json_literal instead
            other => Literal::string(other.to_string()),
        };
        self.add_quad_tracked(
            subject.clone(),
            predicate,
            Term::Literal(literal),
            source_path,
        );
    }

    /// Map a string value to a named-node object, skipping absent values
    pub fn add_optional_uri(
        &mut self,
        subject: &Subject,
        predicate: &str,
        value: Option<&str>,
        source_path: &str,
    ) {
        match value {
            Some(iri) if !iri.is_empty() => {
                self.add_quad_tracked(subject.clone(), predicate, Term::named(iri), source_path);
            }
            _ => {}
        }
    }

    /// Create a typed blank node linked from a parent
    ///
    /// Emits the link quad and the rdf:type quad, returns the fresh blank
    /// subject for further property quads.
    pub fn create_typed_blank_node(
        &mut self,
        parent: &Subject,
        link_predicate: &str,
        type_iri: &str,
        id_prefix: &str,
    ) -> Subject {
        let id = format!("{}{}", id_prefix, self.blank_counter);
        self.blank_counter += 1;
        let node = Subject::blank(id.clone());
        self.add_quad(parent.clone(), link_predicate, Term::blank(id));
        self.add_quad(
            node.clone(),
            chrysalis_core::model::namespaces::rdf_type(),
            Term::named(type_iri),
        );
        node
    }

    /// One literal quad per array element, single source path recorded once
    pub fn add_literal_array(
        &mut self,
        subject: &Subject,
        predicate: &str,
        values: &[Value],
        source_path: &str,
    ) {
        let mut any = false;
        for value in values {
            if let Some(s) = value.as_str() {
                self.quads.push(Quad::new(
                    subject.clone(),
                    predicate,
                    Term::literal(s),
                ));
                any = true;
            }
        }
        if any {
            self.mapped.insert(source_path.to_string());
        }
    }

    /// Serialize a JSON value into a single literal quad with stable key
    /// order; null produces no quad
    pub fn add_json_literal(
        &mut self,
        subject: &Subject,
        predicate: &str,
        value: &Value,
        source_path: &str,
    ) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        let serialized = canonical_json_string(value)?;
        self.add_quad_tracked(
            subject.clone(),
            predicate,
            Term::literal(serialized),
            source_path,
        );
        Ok(())
    }

    /// Preserve a field as an extension property (unmapped bucket)
    pub fn add_extension(
        &mut self,
        namespace: &str,
        property: impl Into<String>,
        value: &Value,
        source_path: impl Into<String>,
    ) -> Result<()> {
        let source_path = source_path.into();
        self.extensions.push(ExtensionProperty::new(
            namespace,
            property,
            value,
            source_path.clone(),
        )?);
        self.unmapped.insert(source_path);
        Ok(())
    }

    /// Carry an already-built extension through unchanged (no tracking)
    pub fn carry_extension(&mut self, extension: ExtensionProperty) {
        self.extensions.push(extension);
    }

    /// Mark a source path mapped without emitting a quad here
    ///
    /// For fields whose information is carried structurally (e.g. a
    /// binding's protocol encoded as the node's rdf:type).
    pub fn mark_mapped(&mut self, source_path: impl Into<String>) {
        self.mapped.insert(source_path.into());
    }

    /// Drop a field, recording the loss with a warning
    pub fn record_lost(&mut self, source_path: impl Into<String>, reason: &str) {
        let path = source_path.into();
        self.warnings.push(format!("field '{}' lost: {}", path, reason));
        self.lost.insert(path);
    }

    /// Add a warning without affecting tracking
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Quads accumulated so far
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    /// Finish the translation, scoring fidelity against the scorer
    pub fn finish(
        self,
        scorer: &FidelityScorer,
        graph: GraphName,
    ) -> (Vec<Quad>, Vec<ExtensionProperty>, TranslationMetadata) {
        let mapped: Vec<String> = self.mapped.into_iter().collect();
        let unmapped: Vec<String> = self.unmapped.into_iter().collect();
        let lost: Vec<String> = self.lost.into_iter().collect();
        let fidelity_score = scorer.score(&mapped, &unmapped, &lost);

        let quads = self
            .quads
            .into_iter()
            .map(|q| q.with_graph(graph.clone()))
            .collect();

        let metadata = TranslationMetadata {
            mapped_fields: mapped,
            unmapped_fields: unmapped,
            lost_fields: lost,
            warnings: self.warnings,
            fidelity_score,
            translated_at: Timestamp::now(),
        };
        (quads, self.extensions, metadata)
    }
}

impl Default for CanonicalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrysalis_core::model::namespaces::ontology;
    use serde_json::json;

    fn subject() -> Subject {
        Subject::named("https://chrysalis.dev/agent/a1")
    }

    #[test]
    fn absent_values_produce_no_quads() {
        let mut builder = CanonicalBuilder::new();
        builder.add_optional_literal(&subject(), ontology::NAME, None, "metadata.name");
        builder.add_optional_literal(
            &subject(),
            ontology::NAME,
            Some(&Value::Null),
            "metadata.name",
        );
        builder.add_optional_literal(
            &subject(),
            ontology::NAME,
            Some(&json!("")),
            "metadata.name",
        );
        assert!(builder.quads().is_empty());
    }

    #[test]
    fn typed_blank_node_emits_link_and_type() {
        let mut builder = CanonicalBuilder::new();
        let tool = builder.create_typed_blank_node(
            &subject(),
            ontology::HAS_TOOL,
            ontology::TOOL,
            "tool",
        );
        assert_eq!(builder.quads().len(), 2);
        assert!(matches!(tool, Subject::Blank(_)));

        // Fresh ids on each call
        let tool2 =
            builder.create_typed_blank_node(&subject(), ontology::HAS_TOOL, ontology::TOOL, "tool");
        assert_ne!(tool, tool2);
    }

    #[test]
    fn literal_array_records_path_once() {
        let mut builder = CanonicalBuilder::new();
        builder.add_literal_array(
            &subject(),
            ontology::TAG,
            &[json!("a"), json!("b")],
            "metadata.tags",
        );
        let scorer = FidelityScorer::from_mappings(&[]);
        let (quads, _, meta) = builder.finish(&scorer, GraphName::Default);
        assert_eq!(quads.len(), 2);
        assert_eq!(meta.mapped_fields, vec!["metadata.tags"]);
    }

    #[test]
    fn json_literal_uses_stable_key_order() {
        let mut builder = CanonicalBuilder::new();
        let value: Value = serde_json::from_str(r#"{"z": 1, "a": 2}"#).unwrap();
        builder
            .add_json_literal(&subject(), ontology::PARAMETERS, &value, "tool.parameters")
            .unwrap();
        let lex = builder.quads()[0]
            .object
            .as_literal()
            .map(|l| l.lexical.clone())
            .unwrap_or_default();
        assert_eq!(lex, r#"{"a":2,"z":1}"#);
    }

    #[test]
    fn finish_separates_tracking_buckets() {
        let mut builder = CanonicalBuilder::new();
        builder.add_optional_literal(
            &subject(),
            ontology::NAME,
            Some(&json!("atlas")),
            "metadata.name",
        );
        builder
            .add_extension(
                "https://chrysalis.dev/ext/usa#",
                "runtime_hints",
                &json!({"x": 1}),
                "runtime_hints",
            )
            .unwrap();
        builder.record_lost("_session", "runtime-only field");

        let scorer = FidelityScorer::from_mappings(&[]);
        let (_, extensions, meta) = builder.finish(&scorer, GraphName::Default);
        assert_eq!(meta.mapped_fields, vec!["metadata.name"]);
        assert_eq!(meta.unmapped_fields, vec!["runtime_hints"]);
        assert_eq!(meta.lost_fields, vec!["_session"]);
        assert_eq!(meta.warnings.len(), 1);
        assert_eq!(extensions.len(), 1);
        // 1 mapped of 3 equally weighted fields
        assert!((meta.fidelity_score - 1.0 / 3.0).abs() < 1e-9);
    }
}
