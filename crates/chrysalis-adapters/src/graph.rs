//! Read helpers over a canonical agent's quads
//!
//! Shared by the concrete adapters' `from_canonical` implementations.

use serde_json::{json, Value};

use chrysalis_core::model::namespaces::{rdf_type, xsd};
use chrysalis_core::model::{CanonicalAgent, Subject, Term};

/// Nodes linked from a parent via a predicate, in quad order
pub fn linked_nodes(canonical: &CanonicalAgent, parent: &Subject, predicate: &str) -> Vec<Subject> {
    canonical
        .quads
        .iter()
        .filter(|q| &q.subject == parent && q.predicate.as_str() == predicate)
        .filter_map(|q| match &q.object {
            Term::Blank(b) => Some(Subject::Blank(b.clone())),
            Term::Named(n) => Some(Subject::Named(n.clone())),
            _ => None,
        })
        .collect()
}

/// The rdf:type IRI of a node, if typed
pub fn node_type(canonical: &CanonicalAgent, node: &Subject) -> Option<String> {
    canonical.quads.iter().find_map(|q| {
        (&q.subject == node && q.predicate.as_str() == rdf_type())
            .then(|| q.object.as_iri().map(|s| s.to_string()))
            .flatten()
    })
}

/// First literal lexical form for (subject, predicate)
pub fn literal_of(canonical: &CanonicalAgent, subject: &Subject, predicate: &str) -> Option<String> {
    canonical.quads.iter().find_map(|q| {
        (&q.subject == subject && q.predicate.as_str() == predicate)
            .then(|| q.object.as_literal().map(|l| l.lexical.clone()))
            .flatten()
    })
}

/// First literal re-materialized with its datatype
///
/// `xsd:integer`, `xsd:double`, and `xsd:boolean` come back as the
/// corresponding JSON scalars; everything else as a JSON string.
pub fn typed_literal_of(
    canonical: &CanonicalAgent,
    subject: &Subject,
    predicate: &str,
) -> Option<Value> {
    canonical.quads.iter().find_map(|q| {
        if &q.subject != subject || q.predicate.as_str() != predicate {
            return None;
        }
        let literal = q.object.as_literal()?;
        if literal.datatype == xsd("integer") {
            literal.lexical.parse::<i64>().ok().map(|i| json!(i))
        } else if literal.datatype == xsd("double") {
            literal.lexical.parse::<f64>().ok().map(|f| json!(f))
        } else if literal.datatype == xsd("boolean") {
            literal.lexical.parse::<bool>().ok().map(|b| json!(b))
        } else {
            Some(json!(literal.lexical.clone()))
        }
    })
}

/// All object terms for (subject, predicate), in quad order
pub fn objects_of<'a>(
    canonical: &'a CanonicalAgent,
    subject: &Subject,
    predicate: &str,
) -> Vec<&'a Term> {
    canonical
        .quads
        .iter()
        .filter(|q| &q.subject == subject && q.predicate.as_str() == predicate)
        .map(|q| &q.object)
        .collect()
}
