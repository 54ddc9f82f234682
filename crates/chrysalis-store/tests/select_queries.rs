//! Conjunctive select over the store
//!
//! Variable bindings must join across patterns and across agents, always
//! against current snapshots.

use chrysalis_core::identifiers::AgentId;
use chrysalis_core::model::namespaces::{ontology, rdf_type};
use chrysalis_core::model::{Quad, Subject, Term};
use chrysalis_store::{PatternTerm, SnapshotMeta, TemporalStore, TriplePattern};

async fn seed(store: &TemporalStore) {
    for (id, name, provider) in [
        ("researcher", "research-agent", "openai"),
        ("scribe", "scribe-agent", "anthropic"),
        ("archivist", "archive-agent", "anthropic"),
    ] {
        let agent = AgentId::new(id);
        let subject = Subject::named(agent.iri());
        let quads = vec![
            Quad::new(subject.clone(), rdf_type(), Term::named(ontology::AGENT)),
            Quad::new(subject.clone(), ontology::NAME, Term::literal(name)),
            Quad::new(subject.clone(), ontology::HAS_LLM_CONFIG, Term::blank("llm0")),
            Quad::new(Subject::blank("llm0"), ontology::PROVIDER, Term::literal(provider)),
        ];
        store
            .create_snapshot(&agent, quads, SnapshotMeta::from_framework("usa"), None)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn join_walks_from_agent_to_provider() {
    let store = TemporalStore::new();
    seed(&store).await;

    let patterns = vec![
        TriplePattern::new(
            PatternTerm::var("agent"),
            PatternTerm::iri(rdf_type()),
            PatternTerm::Term(Term::named(ontology::AGENT)),
        ),
        TriplePattern::new(
            PatternTerm::var("agent"),
            PatternTerm::iri(ontology::HAS_LLM_CONFIG),
            PatternTerm::var("llm"),
        ),
        TriplePattern::new(
            PatternTerm::var("llm"),
            PatternTerm::iri(ontology::PROVIDER),
            PatternTerm::Term(Term::literal("anthropic")),
        ),
        TriplePattern::new(
            PatternTerm::var("agent"),
            PatternTerm::iri(ontology::NAME),
            PatternTerm::var("name"),
        ),
    ];

    let result = store.select(&patterns).await.unwrap();
    assert_eq!(result.variables, vec!["agent", "llm", "name"]);
    assert_eq!(result.bindings.len(), 2);

    let mut names: Vec<String> = result
        .bindings
        .iter()
        .filter_map(|b| b["name"].as_literal().map(|l| l.lexical.clone()))
        .collect();
    names.sort();
    assert_eq!(names, vec!["archive-agent", "scribe-agent"]);
}

#[tokio::test]
async fn blank_node_identity_stays_within_one_snapshot() {
    let store = TemporalStore::new();
    seed(&store).await;

    // Every seeded agent reuses the label "llm0" for its LLM node. The
    // join must not leak one agent's provider into another agent's
    // binding through the shared label.
    let patterns = vec![
        TriplePattern::new(
            PatternTerm::var("agent"),
            PatternTerm::iri(ontology::HAS_LLM_CONFIG),
            PatternTerm::var("llm"),
        ),
        TriplePattern::new(
            PatternTerm::var("llm"),
            PatternTerm::iri(ontology::PROVIDER),
            PatternTerm::Term(Term::literal("openai")),
        ),
    ];
    let result = store.select(&patterns).await.unwrap();
    assert_eq!(result.bindings.len(), 1);
    assert_eq!(
        result.bindings[0]["agent"],
        Term::named(AgentId::new("researcher").iri())
    );
}

#[tokio::test]
async fn select_sees_only_current_snapshots() {
    let store = TemporalStore::new();
    let agent = AgentId::new("versioned");
    let subject = Subject::named(agent.iri());
    let meta = SnapshotMeta::from_framework("usa");

    for name in ["old-name", "new-name"] {
        store
            .create_snapshot(
                &agent,
                vec![
                    Quad::new(subject.clone(), rdf_type(), Term::named(ontology::AGENT)),
                    Quad::new(subject.clone(), ontology::NAME, Term::literal(name)),
                ],
                meta.clone(),
                None,
            )
            .await
            .unwrap();
    }

    let patterns = vec![TriplePattern::new(
        PatternTerm::Term(subject.as_term()),
        PatternTerm::iri(ontology::NAME),
        PatternTerm::var("name"),
    )];
    let result = store.select(&patterns).await.unwrap();
    assert_eq!(result.bindings.len(), 1);
    assert_eq!(result.bindings[0]["name"], Term::literal("new-name"));
}
