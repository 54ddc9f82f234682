//! Quad patterns and conjunctive select evaluation
//!
//! `QuadPattern` is an AND filter over the four quad positions.
//! `TriplePattern` adds variables; `evaluate` joins patterns by shared
//! variable names, propagating bindings left to right.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use chrysalis_core::model::{GraphName, Quad, Subject, Term};

/// AND filter over quad components; `None` matches anything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadPattern {
    /// Subject to match
    pub subject: Option<Subject>,
    /// Predicate IRI to match
    pub predicate: Option<String>,
    /// Object to match
    pub object: Option<Term>,
    /// Graph to match
    pub graph: Option<GraphName>,
}

impl QuadPattern {
    /// Pattern matching every quad
    pub fn any() -> Self {
        Self::default()
    }

    /// Restrict the subject
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Restrict the predicate
    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    /// Restrict the object
    pub fn with_object(mut self, object: Term) -> Self {
        self.object = Some(object);
        self
    }

    /// Restrict the graph
    pub fn with_graph(mut self, graph: GraphName) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Whether a quad satisfies every non-null component
    pub fn matches(&self, quad: &Quad) -> bool {
        if let Some(s) = &self.subject {
            if &quad.subject != s {
                return false;
            }
        }
        if let Some(p) = &self.predicate {
            if quad.predicate.as_str() != p {
                return false;
            }
        }
        if let Some(o) = &self.object {
            if &quad.object != o {
                return false;
            }
        }
        if let Some(g) = &self.graph {
            if &quad.graph != g {
                return false;
            }
        }
        true
    }
}

/// A position in a triple pattern: a variable or a concrete term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternTerm {
    /// Named variable, bound during evaluation
    Var(String),
    /// Concrete term that must match exactly
    Term(Term),
}

impl PatternTerm {
    /// Variable position
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Concrete named-node position
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Term(Term::named(iri))
    }
}

/// One conjunct of a select query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriplePattern {
    /// Subject position
    pub subject: PatternTerm,
    /// Predicate position
    pub predicate: PatternTerm,
    /// Object position
    pub object: PatternTerm,
}

impl TriplePattern {
    /// Construct a pattern
    pub fn new(subject: PatternTerm, predicate: PatternTerm, object: PatternTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// Variable bindings produced by `evaluate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectResult {
    /// Variable names in first-appearance order
    pub variables: Vec<String>,
    /// One map per solution
    pub bindings: Vec<BTreeMap<String, Term>>,
}

type Binding = BTreeMap<String, Term>;

fn unify(position: &PatternTerm, term: &Term, binding: &mut Binding) -> bool {
    match position {
        PatternTerm::Term(expected) => expected == term,
        PatternTerm::Var(name) => match binding.get(name) {
            Some(bound) => bound == term,
            None => {
                binding.insert(name.clone(), term.clone());
                true
            }
        },
    }
}

/// Evaluate conjunctive patterns over a quad set
///
/// Standard nested-loop join: each pattern extends the binding set; shared
/// variable names must unify to the same term.
pub fn evaluate(patterns: &[TriplePattern], quads: &[Quad]) -> SelectResult {
    let mut variables = Vec::new();
    for pattern in patterns {
        for position in [&pattern.subject, &pattern.predicate, &pattern.object] {
            if let PatternTerm::Var(name) = position {
                if !variables.contains(name) {
                    variables.push(name.clone());
                }
            }
        }
    }

    let mut bindings: Vec<Binding> = vec![BTreeMap::new()];
    for pattern in patterns {
        let mut next = Vec::new();
        for binding in &bindings {
            for quad in quads {
                let mut candidate = binding.clone();
                if unify(&pattern.subject, &quad.subject.as_term(), &mut candidate)
                    && unify(&pattern.predicate, &Term::Named(quad.predicate.clone()), &mut candidate)
                    && unify(&pattern.object, &quad.object, &mut candidate)
                {
                    next.push(candidate);
                }
            }
        }
        bindings = next;
        if bindings.is_empty() {
            break;
        }
    }

    // A query with no patterns has no solutions, not one empty solution
    if patterns.is_empty() {
        bindings.clear();
    }

    SelectResult {
        variables,
        bindings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrysalis_core::model::namespaces::{ontology, rdf_type};

    fn sample_quads() -> Vec<Quad> {
        vec![
            Quad::new(
                Subject::named("agent:a"),
                rdf_type(),
                Term::named(ontology::AGENT),
            ),
            Quad::new(Subject::named("agent:a"), ontology::NAME, Term::literal("atlas")),
            Quad::new(
                Subject::named("agent:b"),
                rdf_type(),
                Term::named(ontology::AGENT),
            ),
            Quad::new(Subject::named("agent:b"), ontology::NAME, Term::literal("borges")),
        ]
    }

    #[test]
    fn pattern_components_are_anded() {
        let quads = sample_quads();
        let pattern = QuadPattern::any()
            .with_subject(Subject::named("agent:a"))
            .with_predicate(ontology::NAME);
        let matched: Vec<&Quad> = quads.iter().filter(|q| pattern.matches(q)).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].object, Term::literal("atlas"));
    }

    #[test]
    fn select_joins_on_shared_variables() {
        let quads = sample_quads();
        let patterns = vec![
            TriplePattern::new(
                PatternTerm::var("agent"),
                PatternTerm::iri(rdf_type()),
                PatternTerm::Term(Term::named(ontology::AGENT)),
            ),
            TriplePattern::new(
                PatternTerm::var("agent"),
                PatternTerm::iri(ontology::NAME),
                PatternTerm::var("name"),
            ),
        ];
        let result = evaluate(&patterns, &quads);
        assert_eq!(result.variables, vec!["agent", "name"]);
        assert_eq!(result.bindings.len(), 2);
        let names: Vec<&Term> = result.bindings.iter().map(|b| &b["name"]).collect();
        assert!(names.contains(&&Term::literal("atlas")));
        assert!(names.contains(&&Term::literal("borges")));
    }

    #[test]
    fn contradictory_binding_produces_no_solutions() {
        let quads = sample_quads();
        let patterns = vec![
            TriplePattern::new(
                PatternTerm::var("x"),
                PatternTerm::iri(ontology::NAME),
                PatternTerm::Term(Term::literal("atlas")),
            ),
            TriplePattern::new(
                PatternTerm::var("x"),
                PatternTerm::iri(ontology::NAME),
                PatternTerm::Term(Term::literal("borges")),
            ),
        ];
        assert!(evaluate(&patterns, &quads).bindings.is_empty());
    }

    #[test]
    fn empty_pattern_list_has_no_solutions() {
        assert!(evaluate(&[], &sample_quads()).bindings.is_empty());
    }
}
