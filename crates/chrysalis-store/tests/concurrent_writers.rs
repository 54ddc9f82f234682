//! Concurrent writer scenarios
//!
//! Writers to one agent serialize through the per-agent lock; optimistic
//! writers that lose the race see `TemporalConflict` and retry with a
//! fresh version. Writers to different agents never conflict.

use std::sync::Arc;

use chrysalis_core::errors::ChrysalisError;
use chrysalis_core::identifiers::AgentId;
use chrysalis_core::model::namespaces::{ontology, rdf_type};
use chrysalis_core::model::{Quad, Subject, Term};
use chrysalis_store::{SnapshotMeta, SnapshotSelector, TemporalStore};

fn quads(id: &AgentId, label: &str) -> Vec<Quad> {
    vec![
        Quad::new(Subject::named(id.iri()), rdf_type(), Term::named(ontology::AGENT)),
        Quad::new(Subject::named(id.iri()), ontology::NAME, Term::literal(label)),
    ]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn optimistic_writers_retry_to_a_consistent_history() {
    const WRITERS: usize = 8;
    const WRITES_EACH: usize = 5;

    let store = Arc::new(TemporalStore::new());
    let id = AgentId::new("contended");

    let mut handles = Vec::new();
    for writer in 0..WRITERS {
        let store = Arc::clone(&store);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            for write in 0..WRITES_EACH {
                let label = format!("w{}-{}", writer, write);
                loop {
                    let current = store
                        .get_snapshot(&id, SnapshotSelector::Latest)
                        .await
                        .unwrap()
                        .map(|s| s.version)
                        .unwrap_or(0);
                    match store
                        .create_snapshot(
                            &id,
                            quads(&id, &label),
                            SnapshotMeta::from_framework("usa"),
                            Some(current),
                        )
                        .await
                    {
                        Ok(_) => break,
                        Err(ChrysalisError::TemporalConflict { .. }) => continue,
                        Err(other) => panic!("unexpected error: {:?}", other),
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let history = store.get_history(&id).await.unwrap();
    assert_eq!(history.len(), WRITERS * WRITES_EACH);

    for (index, snapshot) in history.iter().enumerate() {
        assert_eq!(snapshot.version, index as u64 + 1);
    }
    for window in history.windows(2) {
        assert_eq!(window[0].valid_to, Some(window[1].valid_from));
        assert!(window[0].valid_from < window[1].valid_from);
    }
    assert_eq!(history.iter().filter(|s| s.is_current()).count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn writers_to_different_agents_never_conflict() {
    let store = Arc::new(TemporalStore::new());

    let mut handles = Vec::new();
    for agent in 0..6 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let id = AgentId::new(format!("agent-{}", agent));
            for version in 0..10u64 {
                store
                    .create_snapshot(
                        &id,
                        quads(&id, &format!("v{}", version + 1)),
                        SnapshotMeta::from_framework("usa"),
                        Some(version),
                    )
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_agents, 6);
    assert_eq!(stats.total_snapshots, 60);
}
