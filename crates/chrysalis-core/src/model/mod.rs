//! Framework-neutral canonical agent model
//!
//! Agents are represented as RDF-style quads over a fixed agent ontology,
//! with extension properties carrying the long tail of native fields the
//! ontology does not express. The N-Triples codec is the canonical wire
//! form; `parse ∘ serialize` is a bag-equality identity.

pub mod agent;
pub mod namespaces;
pub mod ntriples;
pub mod term;

pub use agent::{
    AgentSummary, CanonicalAgent, ExtensionProperty, NativeAgent, TranslationMetadata,
};
pub use ntriples::{parse_quads, serialize_quads};
pub use term::{BlankNode, GraphName, Literal, NamedNode, Quad, Subject, Term};
