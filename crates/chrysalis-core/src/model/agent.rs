//! Canonical and native agent representations
//!
//! A [`CanonicalAgent`] is the framework-neutral graph form: the agent's
//! quads plus the extension bag for fields the ontology does not express
//! and the translation bookkeeping that feeds the fidelity score. A
//! [`NativeAgent`] is an opaque JSON document tagged with its framework.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::namespaces::{self, ontology};
use super::term::{GraphName, Quad, Subject, Term};
use crate::errors::{ChrysalisError, Result};
use crate::identifiers::{AgentId, FrameworkTag};
use crate::time::Timestamp;

/// An agent as expressed in a specific framework's native shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeAgent {
    /// Framework the document belongs to
    pub framework: FrameworkTag,
    /// The native document
    pub document: serde_json::Value,
}

impl NativeAgent {
    /// Create a native agent
    pub fn new(framework: impl Into<FrameworkTag>, document: serde_json::Value) -> Self {
        Self {
            framework: framework.into(),
            document,
        }
    }
}

/// A namespaced property preserved outside the ontology
///
/// Extensions reference their original location by source path (a dotted
/// JSON path), never by graph structure, so round-trips can place values
/// back exactly where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionProperty {
    /// Extension namespace (one per adapter)
    pub namespace: String,
    /// Property name within the namespace
    pub property: String,
    /// Value, JSON-serialized
    pub value: String,
    /// Dotted path of the field in the source document
    pub source_path: String,
}

impl ExtensionProperty {
    /// Create an extension property from a JSON value
    pub fn new(
        namespace: impl Into<String>,
        property: impl Into<String>,
        value: &serde_json::Value,
        source_path: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            namespace: namespace.into(),
            property: property.into(),
            value: serde_json::to_string(value)?,
            source_path: source_path.into(),
        })
    }

    /// Parse the stored value back into JSON
    pub fn json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.value)?)
    }
}

/// Bookkeeping produced by a translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationMetadata {
    /// Source paths mapped onto ontology quads
    pub mapped_fields: Vec<String>,
    /// Source paths preserved as extensions
    pub unmapped_fields: Vec<String>,
    /// Source paths dropped with a warning
    pub lost_fields: Vec<String>,
    /// Human-readable warnings
    pub warnings: Vec<String>,
    /// Weighted share of mapped fields, in [0, 1]
    pub fidelity_score: f64,
    /// When the translation ran
    pub translated_at: Timestamp,
}

impl TranslationMetadata {
    /// Empty metadata with a perfect score
    pub fn empty() -> Self {
        Self {
            mapped_fields: Vec::new(),
            unmapped_fields: Vec::new(),
            lost_fields: Vec::new(),
            warnings: Vec::new(),
            fidelity_score: 1.0,
            translated_at: Timestamp::now(),
        }
    }

    /// Check the structural invariants
    ///
    /// Mapped/unmapped and mapped/lost must be disjoint; the fidelity score
    /// must lie in [0, 1].
    pub fn validate(&self) -> Result<()> {
        let mapped: BTreeSet<&String> = self.mapped_fields.iter().collect();
        for path in &self.unmapped_fields {
            if mapped.contains(path) {
                return Err(ChrysalisError::internal(format!(
                    "field '{}' is both mapped and unmapped",
                    path
                )));
            }
        }
        for path in &self.lost_fields {
            if mapped.contains(path) {
                return Err(ChrysalisError::internal(format!(
                    "field '{}' is both mapped and lost",
                    path
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.fidelity_score) {
            return Err(ChrysalisError::internal(format!(
                "fidelity score {} out of range",
                self.fidelity_score
            )));
        }
        Ok(())
    }
}

/// The framework-neutral graph representation of an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAgent {
    /// Agent identity
    pub id: AgentId,
    /// Canonical agent IRI
    pub uri: String,
    /// The agent's quads
    pub quads: Vec<Quad>,
    /// Framework the agent was ingested from
    pub source_framework: FrameworkTag,
    /// Fields the ontology does not express
    pub extensions: Vec<ExtensionProperty>,
    /// Translation bookkeeping
    pub metadata: TranslationMetadata,
}

impl CanonicalAgent {
    /// Create an empty canonical agent for an identity
    pub fn new(id: AgentId, source_framework: FrameworkTag) -> Self {
        let uri = id.iri();
        Self {
            id,
            uri,
            quads: Vec::new(),
            source_framework,
            extensions: Vec::new(),
            metadata: TranslationMetadata::empty(),
        }
    }

    /// Whether the agent-typing quad is present
    pub fn has_agent_type_quad(&self) -> bool {
        self.quads.iter().any(|q| {
            q.subject == Subject::named(&self.uri)
                && q.predicate.as_str() == namespaces::rdf_type()
                && q.object == Term::named(ontology::AGENT)
        })
    }

    /// Validate the canonical invariants
    pub fn validate(&self) -> Result<()> {
        if !self.has_agent_type_quad() {
            return Err(ChrysalisError::internal(format!(
                "agent {} lacks an rdf:type chrysalis:Agent quad",
                self.id
            )));
        }
        self.metadata.validate()
    }

    /// First literal object for a predicate on the agent subject
    pub fn literal_value(&self, predicate: &str) -> Option<&str> {
        self.quads.iter().find_map(|q| {
            if q.subject == Subject::named(&self.uri) && q.predicate.as_str() == predicate {
                q.object.as_literal().map(|l| l.lexical.as_str())
            } else {
                None
            }
        })
    }

    /// All extensions in a namespace
    pub fn extensions_in<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a ExtensionProperty> + 'a {
        self.extensions.iter().filter(move |e| e.namespace == namespace)
    }

    /// Quads for persistence: the agent's quads plus the extension bag
    /// encoded as typed `chrysalis:Extension` nodes
    ///
    /// The temporal store holds only quads; this encoding lets a stored
    /// snapshot rebuild the full canonical agent, extensions included.
    pub fn to_store_quads(&self) -> Vec<Quad> {
        let mut quads = self.quads.clone();
        let agent = Subject::named(&self.uri);
        for (index, extension) in self.extensions.iter().enumerate() {
            let node = Subject::blank(format!("ext{}", index));
            quads.push(Quad::new(
                agent.clone(),
                ontology::HAS_EXTENSION,
                Term::blank(format!("ext{}", index)),
            ));
            quads.push(Quad::new(
                node.clone(),
                namespaces::rdf_type(),
                Term::named(ontology::EXTENSION),
            ));
            quads.push(Quad::new(
                node.clone(),
                ontology::EXT_NAMESPACE,
                Term::named(extension.namespace.clone()),
            ));
            quads.push(Quad::new(
                node.clone(),
                ontology::EXT_PROPERTY,
                Term::literal(extension.property.clone()),
            ));
            quads.push(Quad::new(
                node.clone(),
                ontology::EXT_VALUE,
                Term::literal(extension.value.clone()),
            ));
            quads.push(Quad::new(
                node,
                ontology::EXT_SOURCE_PATH,
                Term::literal(extension.source_path.clone()),
            ));
        }
        quads
    }

    /// Rebuild a canonical agent from stored quads
    ///
    /// Inverse of [`Self::to_store_quads`]: extension nodes are lifted back
    /// into the extension bag and removed from the quad set.
    pub fn from_store_quads(
        id: AgentId,
        quads: Vec<Quad>,
        source_framework: FrameworkTag,
    ) -> Self {
        let uri = id.iri();
        let agent = Subject::named(&uri);

        let mut extension_nodes: Vec<Subject> = Vec::new();
        for quad in &quads {
            if quad.subject == agent && quad.predicate.as_str() == ontology::HAS_EXTENSION {
                if let Term::Blank(b) = &quad.object {
                    extension_nodes.push(Subject::Blank(b.clone()));
                }
            }
        }

        let field_of = |node: &Subject, predicate: &str| -> Option<String> {
            quads.iter().find_map(|q| {
                (&q.subject == node && q.predicate.as_str() == predicate).then(|| match &q.object {
                    Term::Literal(l) => Some(l.lexical.clone()),
                    Term::Named(n) => Some(n.as_str().to_string()),
                    _ => None,
                })?
            })
        };

        let mut extensions = Vec::new();
        for node in &extension_nodes {
            let (Some(namespace), Some(property), Some(value), Some(source_path)) = (
                field_of(node, ontology::EXT_NAMESPACE),
                field_of(node, ontology::EXT_PROPERTY),
                field_of(node, ontology::EXT_VALUE),
                field_of(node, ontology::EXT_SOURCE_PATH),
            ) else {
                continue;
            };
            extensions.push(ExtensionProperty {
                namespace,
                property,
                value,
                source_path,
            });
        }

        let quads = quads
            .into_iter()
            .filter(|q| {
                !(q.subject == agent && q.predicate.as_str() == ontology::HAS_EXTENSION)
                    && !extension_nodes.contains(&q.subject)
            })
            .map(|q| q.with_graph(GraphName::Default))
            .collect();

        Self {
            id,
            uri,
            quads,
            source_framework,
            extensions,
            metadata: TranslationMetadata::empty(),
        }
    }
}

/// Summary row returned by agent discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    /// Agent id
    pub id: AgentId,
    /// Display name, if known
    pub name: Option<String>,
    /// Source framework of the latest snapshot
    pub framework: FrameworkTag,
    /// Capability names (tool names)
    pub capabilities: Vec<String>,
    /// Number of stored versions
    pub version_count: u64,
    /// Last update time
    pub updated_at: Timestamp,
}
