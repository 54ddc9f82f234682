//! End-to-end orchestrator scenarios
//!
//! Acceptance scenarios that span multiple subsystems: batch translation
//! with continue-on-error, cached translation, auto-persist with history,
//! shadow restoration through the orchestrator surface, round-trip diffs,
//! and event emission.

use serde_json::json;
use std::time::Duration;

use assert_matches::assert_matches;
use chrysalis_core::cancel::CancelToken;
use chrysalis_core::config::ChrysalisConfig;
use chrysalis_core::errors::ChrysalisError;
use chrysalis_core::identifiers::{AgentId, FrameworkTag};
use chrysalis_core::model::NativeAgent;
use chrysalis_orchestrator::{
    BatchRequest, EventKind, GetAgentOutput, Orchestrator, SubscriptionFilter, TranslateOptions,
};
use chrysalis_store::DiscoveryCriteria;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn usa_agent(name: &str) -> NativeAgent {
    NativeAgent::new(
        "usa",
        json!({
            "metadata": {"name": name, "description": "test agent"},
            "identity": {"role": "researcher", "goal": "find things"},
            "capabilities": {
                "tools": [{"name": "web_search", "description": "search the web"}]
            },
            "execution": {
                "llm": {"provider": "openai", "model": "gpt-4-turbo", "temperature": 0.7}
            },
            "runtime_hints": {"retries": 3}
        }),
    )
}

fn lmos_tag() -> FrameworkTag {
    FrameworkTag::new("lmos")
}

#[tokio::test]
async fn translate_produces_target_shape_with_high_fidelity() {
    init_tracing();
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    let result = orchestrator
        .translate(&usa_agent("research-agent"), &lmos_tag(), TranslateOptions::default())
        .await
        .unwrap();

    assert!(result.success, "errors: {:?}", result.errors);
    assert!(result.fidelity_score >= 0.9);
    assert!(!result.from_cache);
    let output = result.output.unwrap();
    assert_eq!(output.framework, lmos_tag());
    assert_eq!(output.document["title"], json!("research-agent"));
}

#[tokio::test]
async fn repeated_translation_hits_the_cache() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    let agent = usa_agent("research-agent");

    let first = orchestrator
        .translate(&agent, &lmos_tag(), TranslateOptions::default())
        .await
        .unwrap();
    let second = orchestrator
        .translate(&agent, &lmos_tag(), TranslateOptions::default())
        .await
        .unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(
        first.output.unwrap().document,
        second.output.unwrap().document
    );
    let stats = orchestrator.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);

    orchestrator.clear_cache();
    assert_eq!(orchestrator.cache_stats().entries, 0);
}

#[tokio::test]
async fn batch_translate_continues_past_invalid_entries() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    let invalid = NativeAgent::new("usa", json!({"metadata": {"description": "nameless"}}));

    let outcome = orchestrator
        .batch_translate(BatchRequest {
            agents: vec![usa_agent("first"), invalid, usa_agent("third")],
            target: lmos_tag(),
            continue_on_error: true,
            parallel: false,
        })
        .await
        .unwrap();

    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.results.len(), 3);

    let failure = &outcome.results[1];
    assert!(!failure.success);
    match &failure.errors[0] {
        ChrysalisError::Validation { field_path, .. } => {
            assert_eq!(field_path.as_deref(), Some("metadata.name"));
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_batch_matches_sequential_results() {
    let orchestrator = Orchestrator::new(ChrysalisConfig {
        enable_cache: false,
        ..ChrysalisConfig::default()
    })
    .unwrap();
    let agents: Vec<NativeAgent> = (0..6).map(|i| usa_agent(&format!("agent-{}", i))).collect();

    let outcome = orchestrator
        .batch_translate(BatchRequest {
            agents: agents.clone(),
            target: lmos_tag(),
            continue_on_error: true,
            parallel: true,
        })
        .await
        .unwrap();

    assert_eq!(outcome.total, 6);
    assert_eq!(outcome.succeeded, 6);
    assert_eq!(outcome.failed, 0);
    // Submission order is preserved even under concurrency
    for (agent, result) in agents.iter().zip(&outcome.results) {
        let title = &result.output.as_ref().unwrap().document["title"];
        assert_eq!(title, &agent.document["metadata"]["name"]);
    }
}

#[tokio::test]
async fn batch_translate_stops_on_error_when_asked() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    let invalid = NativeAgent::new("usa", json!({}));

    let outcome = orchestrator
        .batch_translate(BatchRequest {
            agents: vec![invalid, usa_agent("never-reached")],
            target: lmos_tag(),
            continue_on_error: false,
            parallel: false,
        })
        .await
        .unwrap();

    assert_eq!(outcome.total, 2);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.failed, 1);
}

#[tokio::test]
async fn auto_persist_builds_history_and_supports_retrieval() {
    let config = ChrysalisConfig {
        auto_persist: true,
        enable_cache: false,
        ..ChrysalisConfig::default()
    };
    let orchestrator = Orchestrator::new(config).unwrap();
    let agent = usa_agent("research-agent");
    let id = AgentId::from_name("research-agent");

    orchestrator
        .translate(&agent, &lmos_tag(), TranslateOptions::default())
        .await
        .unwrap();
    orchestrator
        .translate(&agent, &lmos_tag(), TranslateOptions::default())
        .await
        .unwrap();

    let history = orchestrator.get_agent_history(&id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].version, 2);

    // Canonical retrieval carries the extension bag back out of the store
    let Some(GetAgentOutput::Canonical(canonical)) =
        orchestrator.get_agent(&id, None).await.unwrap()
    else {
        panic!("expected canonical agent");
    };
    assert!(canonical.extensions.iter().any(|e| e.source_path == "runtime_hints"));

    // Native retrieval reconstructs the USA shape from stored quads
    let Some(GetAgentOutput::Native(native)) = orchestrator
        .get_agent(&id, Some(&FrameworkTag::new("usa")))
        .await
        .unwrap()
    else {
        panic!("expected native agent");
    };
    assert_eq!(native.document["metadata"]["name"], json!("research-agent"));
    assert_eq!(native.document["runtime_hints"], json!({"retries": 3}));
}

#[tokio::test]
async fn shadow_round_trip_through_the_orchestrator() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    let agent = usa_agent("research-agent");

    let result = orchestrator
        .translate(
            &agent,
            &lmos_tag(),
            TranslateOptions {
                embed_shadow: true,
                ..TranslateOptions::default()
            },
        )
        .await
        .unwrap();
    assert!(result.success);
    let key = result.restoration_key.expect("restoration key");
    let target = result.output.unwrap();
    assert!(target.document.get("_shadow").is_some());

    let restored = orchestrator.open_shadow(&target, &key).await.unwrap();
    assert_eq!(restored, agent);

    let err = orchestrator.open_shadow(&target, "not-a-key").await.unwrap_err();
    assert_matches!(err, ChrysalisError::InvalidKey { .. });
}

#[tokio::test]
async fn round_trip_report_restores_everything_but_runtime_state() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    let report = orchestrator.round_trip_test(&usa_agent("research-agent")).await.unwrap();

    assert!(report.fidelity_score >= 0.9);
    assert!(
        report.diff.is_empty(),
        "unexpected differences: {:?}",
        report.diff
    );
}

#[tokio::test]
async fn events_carry_correlation_and_respect_filters() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    let mut translated = orchestrator.subscribe(SubscriptionFilter::Kind(EventKind::AgentTranslated));
    let mut all = orchestrator.subscribe(SubscriptionFilter::All);

    let result = orchestrator
        .translate(&usa_agent("research-agent"), &lmos_tag(), TranslateOptions::default())
        .await
        .unwrap();

    let ingested = all.recv().await.unwrap();
    assert_eq!(ingested.kind, EventKind::AgentIngested);
    assert_eq!(ingested.correlation_id, result.correlation_id);

    let translated_event = translated.recv().await.unwrap();
    assert_eq!(translated_event.kind, EventKind::AgentTranslated);
    assert_eq!(translated_event.correlation_id, result.correlation_id);
    assert_eq!(translated_event.payload["from_cache"], json!(false));

    let history = orchestrator.event_history(10);
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn discovery_and_deletion_through_the_surface() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    orchestrator.store_agent(&usa_agent("research-agent")).await.unwrap();
    orchestrator.store_agent(&usa_agent("writer-agent")).await.unwrap();

    let found = orchestrator
        .discover_agents(&DiscoveryCriteria {
            has_capability: vec!["web_search".into()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 2);

    let page = orchestrator.list_agents(Some(1), 1).await.unwrap();
    assert_eq!(page.len(), 1);

    let id = AgentId::from_name("research-agent");
    assert!(orchestrator.delete_agent(&id).await.unwrap());
    assert!(!orchestrator.delete_agent(&id).await.unwrap());
    assert_eq!(orchestrator.stats().await.unwrap().total_agents, 1);

    let deleted = orchestrator
        .event_history(10)
        .into_iter()
        .filter(|e| e.kind == EventKind::AgentDeleted)
        .count();
    assert_eq!(deleted, 1);
}

#[tokio::test]
async fn compatibility_matrix_tracks_fidelity_averages() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    orchestrator
        .translate(&usa_agent("a"), &lmos_tag(), TranslateOptions::default())
        .await
        .unwrap();
    orchestrator
        .translate(&usa_agent("b"), &lmos_tag(), TranslateOptions::default())
        .await
        .unwrap();

    let entries = orchestrator.compatibility_matrix();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].count, 2);
    assert!(entries[0].average_fidelity >= 0.9);
}

#[tokio::test]
async fn low_fidelity_warns_instead_of_failing() {
    let config = ChrysalisConfig {
        min_fidelity_score: 0.999,
        ..ChrysalisConfig::default()
    };
    let orchestrator = Orchestrator::new(config).unwrap();
    let result = orchestrator
        .translate(&usa_agent("research-agent"), &lmos_tag(), TranslateOptions::default())
        .await
        .unwrap();
    assert!(result.success);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("below configured minimum")));
}

#[tokio::test]
async fn cancellation_aborts_recoverably() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = orchestrator
        .translate(
            &usa_agent("research-agent"),
            &lmos_tag(),
            TranslateOptions {
                cancel: Some(cancel),
                ..TranslateOptions::default()
            },
        )
        .await
        .unwrap();
    assert!(!result.success);
    assert_matches!(result.errors[0], ChrysalisError::Aborted);
    assert!(result.errors[0].is_retryable());
}

#[tokio::test]
async fn generous_timeout_does_not_interfere() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    let result = orchestrator
        .translate(
            &usa_agent("research-agent"),
            &lmos_tag(),
            TranslateOptions {
                timeout: Some(Duration::from_secs(10)),
                ..TranslateOptions::default()
            },
        )
        .await
        .unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn unknown_target_framework_is_a_configuration_failure() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    let result = orchestrator
        .translate(
            &usa_agent("research-agent"),
            &FrameworkTag::new("crewai"),
            TranslateOptions::default(),
        )
        .await
        .unwrap();
    assert!(!result.success);
    assert_matches!(result.errors[0], ChrysalisError::Configuration { .. });
}

#[tokio::test]
async fn disposal_is_idempotent_and_later_use_fails() {
    let orchestrator = Orchestrator::new(ChrysalisConfig::default()).unwrap();
    orchestrator.dispose();
    orchestrator.dispose();
    let err = orchestrator
        .translate(&usa_agent("a"), &lmos_tag(), TranslateOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, ChrysalisError::Disposed { .. });
}

#[tokio::test]
async fn periodic_health_checks_recover_degraded_adapters() {
    use std::sync::Arc;

    let config = ChrysalisConfig {
        adapters: chrysalis_core::config::AdapterConfig {
            health_check_interval_ms: 10,
        },
        ..ChrysalisConfig::default()
    };
    let orchestrator = Arc::new(Orchestrator::new(config).unwrap());
    let handle = orchestrator.spawn_health_checker();

    let tag = FrameworkTag::new("usa");
    orchestrator
        .registry()
        .set_health(&tag, chrysalis_adapters::HealthStatus::Degraded);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        orchestrator.registry().health(&tag),
        Some(chrysalis_adapters::HealthStatus::Healthy)
    );

    orchestrator.dispose();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(handle.is_finished());
}

#[tokio::test]
async fn invalid_configuration_is_rejected_at_construction() {
    let config = ChrysalisConfig {
        min_fidelity_score: 7.0,
        ..ChrysalisConfig::default()
    };
    let err = Orchestrator::new(config).unwrap_err();
    assert_matches!(err, ChrysalisError::Configuration { .. });
}
