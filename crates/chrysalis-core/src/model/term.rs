//! RDF term and quad ADTs
//!
//! Terms come in four kinds; the `Subject` and `GraphName` enums encode the
//! positional restrictions (predicates are always named nodes, objects are
//! anything but the default graph). Blank node identity is local to the
//! snapshot that contains it.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::namespaces;

/// An IRI-named node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamedNode(pub String);

impl NamedNode {
    /// Create a named node from an IRI
    pub fn new(iri: impl Into<String>) -> Self {
        Self(iri.into())
    }

    /// The IRI string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// A blank node with a snapshot-local identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlankNode(pub String);

impl BlankNode {
    /// Create a blank node with a local id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The local id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// A literal value with datatype and optional language tag
///
/// Equality is (lexical, datatype, language). The default datatype is
/// `xsd:string`; language-tagged literals use `rdf:langString` per the RDF
/// data model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    /// Lexical form
    pub lexical: String,
    /// Datatype IRI
    pub datatype: String,
    /// Optional BCP 47 language tag
    pub language: Option<String>,
}

impl Literal {
    /// Plain string literal (`xsd:string`)
    pub fn string(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: namespaces::xsd("string"),
            language: None,
        }
    }

    /// Typed literal
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// Language-tagged literal
    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: namespaces::rdf("langString"),
            language: Some(language.into()),
        }
    }

    /// `xsd:double` literal from a float
    pub fn double(value: f64) -> Self {
        Self::typed(format!("{}", value), namespaces::xsd("double"))
    }

    /// `xsd:integer` literal
    pub fn integer(value: i64) -> Self {
        Self::typed(format!("{}", value), namespaces::xsd("integer"))
    }

    /// `xsd:boolean` literal
    pub fn boolean(value: bool) -> Self {
        Self::typed(if value { "true" } else { "false" }, namespaces::xsd("boolean"))
    }
}

/// Any term that can appear in a quad
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// IRI-named node
    Named(NamedNode),
    /// Blank node
    Blank(BlankNode),
    /// Literal
    Literal(Literal),
    /// The default graph (graph position only)
    DefaultGraph,
}

impl Term {
    /// Named-node term from an IRI
    pub fn named(iri: impl Into<String>) -> Self {
        Self::Named(NamedNode::new(iri))
    }

    /// Blank-node term
    pub fn blank(id: impl Into<String>) -> Self {
        Self::Blank(BlankNode::new(id))
    }

    /// Plain string literal term
    pub fn literal(lexical: impl Into<String>) -> Self {
        Self::Literal(Literal::string(lexical))
    }

    /// The literal, if this term is one
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// The IRI, if this term is a named node
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Named(n) => Some(n.as_str()),
            _ => None,
        }
    }
}

impl From<Literal> for Term {
    fn from(l: Literal) -> Self {
        Term::Literal(l)
    }
}

impl From<NamedNode> for Term {
    fn from(n: NamedNode) -> Self {
        Term::Named(n)
    }
}

impl From<BlankNode> for Term {
    fn from(b: BlankNode) -> Self {
        Term::Blank(b)
    }
}

/// Subject position: named or blank node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    /// IRI-named subject
    Named(NamedNode),
    /// Blank-node subject
    Blank(BlankNode),
}

impl Subject {
    /// Named subject from an IRI
    pub fn named(iri: impl Into<String>) -> Self {
        Self::Named(NamedNode::new(iri))
    }

    /// Blank subject
    pub fn blank(id: impl Into<String>) -> Self {
        Self::Blank(BlankNode::new(id))
    }

    /// View as a general term
    pub fn as_term(&self) -> Term {
        match self {
            Subject::Named(n) => Term::Named(n.clone()),
            Subject::Blank(b) => Term::Blank(b.clone()),
        }
    }
}

/// Graph position: named graph or the default graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GraphName {
    /// Named graph
    Named(NamedNode),
    /// Default graph
    Default,
}

impl GraphName {
    /// Named graph from an IRI
    pub fn named(iri: impl Into<String>) -> Self {
        Self::Named(NamedNode::new(iri))
    }
}

impl Default for GraphName {
    fn default() -> Self {
        Self::Default
    }
}

/// A subject-predicate-object-graph tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quad {
    /// Subject
    pub subject: Subject,
    /// Predicate (always a named node)
    pub predicate: NamedNode,
    /// Object
    pub object: Term,
    /// Containing graph
    pub graph: GraphName,
}

impl Quad {
    /// Construct a quad in the default graph
    pub fn new(subject: Subject, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: NamedNode::new(predicate),
            object,
            graph: GraphName::Default,
        }
    }

    /// Construct a quad in a named graph
    pub fn in_graph(
        subject: Subject,
        predicate: impl Into<String>,
        object: Term,
        graph: GraphName,
    ) -> Self {
        Self {
            subject,
            predicate: NamedNode::new(predicate),
            object,
            graph,
        }
    }

    /// Copy of this quad moved into another graph
    pub fn with_graph(&self, graph: GraphName) -> Self {
        Self {
            graph,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_equality_includes_datatype_and_language() {
        assert_eq!(Literal::string("a"), Literal::string("a"));
        assert_ne!(Literal::string("1"), Literal::integer(1));
        assert_ne!(Literal::lang("hi", "en"), Literal::lang("hi", "de"));
        assert_ne!(Literal::string("hi"), Literal::lang("hi", "en"));
    }

    #[test]
    fn named_node_equality_is_by_iri() {
        assert_eq!(
            Term::named("https://chrysalis.dev/ontology#Agent"),
            Term::named("https://chrysalis.dev/ontology#Agent")
        );
    }

    #[test]
    fn quad_with_graph_replaces_graph_only() {
        let q = Quad::new(Subject::named("s"), "p", Term::literal("o"));
        let g = q.with_graph(GraphName::named("g"));
        assert_eq!(g.subject, q.subject);
        assert_eq!(g.graph, GraphName::named("g"));
    }
}
