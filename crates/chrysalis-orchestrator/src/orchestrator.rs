//! The orchestrator
//!
//! Selects adapters by framework tag, routes every translation through the
//! canonical model, and wires in persistence, caching, shadow embedding,
//! fidelity accounting, and events. Per-call failures (validation,
//! translation, configuration) surface inside [`TranslationResult`];
//! only misuse of a disposed orchestrator is a hard error.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, Instrument};

use chrysalis_adapters::{AdapterRegistry, ElizaAdapter, LmosAdapter, Severity, UsaAdapter};
use chrysalis_core::cancel::CancelToken;
use chrysalis_core::config::ChrysalisConfig;
use chrysalis_core::errors::{ChrysalisError, Result};
use chrysalis_core::identifiers::{AgentId, CorrelationId, FrameworkTag};
use chrysalis_core::model::{AgentSummary, CanonicalAgent, NativeAgent};
use chrysalis_shadow::RestorationKey;
use chrysalis_store::{
    DiscoveryCriteria, Snapshot, SnapshotMeta, SnapshotSelector, StoreStats, TemporalStore,
};

use crate::cache::{cache_key, CacheStats, CachedTranslation, TranslationCache};
use crate::diff::{diff_documents, DiffEntry};
use crate::events::{Event, EventBus, EventKind, SubscriptionFilter};
use crate::matrix::{CompatibilityEntry, CompatibilityMatrix};

/// Per-call translation options
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Embed a shadow envelope in the target
    pub embed_shadow: bool,
    /// Override the configured `auto_persist`
    pub persist: Option<bool>,
    /// Deadline for the whole call
    pub timeout: Option<Duration>,
    /// Cooperative cancellation
    pub cancel: Option<CancelToken>,
}

/// Outcome of one translation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    /// Whether the translation produced an output
    pub success: bool,
    /// The translated agent, on success
    pub output: Option<NativeAgent>,
    /// The canonical intermediate, on success
    pub canonical: Option<CanonicalAgent>,
    /// Fidelity of the translation
    pub fidelity_score: f64,
    /// Whether the output came from the cache
    pub from_cache: bool,
    /// Restoration key, when a shadow was embedded
    pub restoration_key: Option<String>,
    /// Failures, empty on success
    pub errors: Vec<ChrysalisError>,
    /// Non-fatal findings
    pub warnings: Vec<String>,
    /// Correlation id threading events and spans
    pub correlation_id: CorrelationId,
    /// Wall-clock duration of the call
    pub duration_ms: u64,
}

impl TranslationResult {
    fn failure(correlation_id: CorrelationId, errors: Vec<ChrysalisError>, warnings: Vec<String>) -> Self {
        Self {
            success: false,
            output: None,
            canonical: None,
            fidelity_score: 0.0,
            from_cache: false,
            restoration_key: None,
            errors,
            warnings,
            correlation_id,
            duration_ms: 0,
        }
    }
}

/// What `get_agent` returns, depending on the requested shape
#[derive(Debug, Clone)]
pub enum GetAgentOutput {
    /// The canonical graph form
    Canonical(CanonicalAgent),
    /// Reconstructed into a target framework
    Native(NativeAgent),
}

/// Outcome of a same-framework round trip
#[derive(Debug, Clone)]
pub struct RoundTripReport {
    /// The input agent
    pub original: NativeAgent,
    /// The canonical intermediate
    pub canonical: CanonicalAgent,
    /// The reconstruction from canonical
    pub reconstructed: NativeAgent,
    /// Fidelity of the ingestion
    pub fidelity_score: f64,
    /// Structural differences between original and reconstruction
    pub diff: Vec<DiffEntry>,
}

/// A batch translation request
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Agents to translate
    pub agents: Vec<NativeAgent>,
    /// Target framework for all of them
    pub target: FrameworkTag,
    /// Keep going past failed entries
    pub continue_on_error: bool,
    /// Translate concurrently
    pub parallel: bool,
}

/// Outcome of a batch
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Entries submitted
    pub total: usize,
    /// Entries that succeeded
    pub succeeded: usize,
    /// Entries that failed
    pub failed: usize,
    /// Per-entry results, in submission order
    pub results: Vec<TranslationResult>,
}

/// The stable entry point of the Chrysalis core
pub struct Orchestrator {
    config: ChrysalisConfig,
    registry: AdapterRegistry,
    store: TemporalStore,
    cache: TranslationCache,
    matrix: CompatibilityMatrix,
    events: EventBus,
    signing: chrysalis_core::crypto::SigningKeyPair,
    disposed: AtomicBool,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Build an orchestrator with the shipped adapters registered
    pub fn new(config: ChrysalisConfig) -> Result<Self> {
        if let Err(issues) = config.validate() {
            let summary: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
            return Err(ChrysalisError::configuration(summary.join("; ")));
        }
        let registry = AdapterRegistry::new();
        registry.register(Arc::new(UsaAdapter::new()));
        registry.register(Arc::new(LmosAdapter::new()));
        registry.register(Arc::new(ElizaAdapter::new()));

        Ok(Self {
            cache: TranslationCache::new(config.cache.max_entries),
            events: EventBus::new(config.event_bus.clone()),
            store: TemporalStore::new(),
            matrix: CompatibilityMatrix::new(),
            registry,
            signing: chrysalis_core::crypto::SigningKeyPair::generate(),
            config,
            disposed: AtomicBool::new(false),
        })
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(ChrysalisError::disposed("orchestrator"));
        }
        Ok(())
    }

    /// The adapter registry, for registering additional frameworks
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// The underlying temporal store
    pub fn store(&self) -> &TemporalStore {
        &self.store
    }

    /// Public key verifying this orchestrator's shadow signatures
    pub fn verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        self.signing.verifying_key()
    }

    /// Translate a native agent into a target framework
    pub async fn translate(
        &self,
        native: &NativeAgent,
        target: &FrameworkTag,
        opts: TranslateOptions,
    ) -> Result<TranslationResult> {
        self.ensure_live()?;
        let correlation = CorrelationId::new();
        let started = Instant::now();
        let span = info_span!("translate", source = %native.framework, target = %target, correlation = %correlation);

        let inner = self.translate_inner(native, target, &opts, correlation);
        let outcome = match opts.timeout {
            Some(limit) => match tokio::time::timeout(limit, inner.instrument(span)).await {
                Ok(result) => result,
                Err(_) => Err(ChrysalisError::Timeout {
                    elapsed_ms: limit.as_millis() as u64,
                }),
            },
            None => inner.instrument(span).await,
        };

        let mut result = match outcome {
            Ok(result) => result,
            Err(err @ ChrysalisError::Disposed { .. }) => return Err(err),
            Err(err) => {
                let context = chrysalis_core::errors::ErrorContext::new("orchestrator", "translate")
                    .with_correlation(correlation);
                tracing::warn!(?context, error = %err, category = err.category(), "translation failed");
                TranslationResult::failure(correlation, vec![err], Vec::new())
            }
        };
        result.duration_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn translate_inner(
        &self,
        native: &NativeAgent,
        target: &FrameworkTag,
        opts: &TranslateOptions,
        correlation: CorrelationId,
    ) -> Result<TranslationResult> {
        let pipeline_started = Instant::now();
        let mut warnings = Vec::new();
        if let Some(cancel) = &opts.cancel {
            cancel.check()?;
        }

        let (source_adapter, source_health) = self.registry.get(&native.framework)?;
        if source_health != chrysalis_adapters::HealthStatus::Healthy {
            warnings.push(format!("source adapter '{}' is degraded", native.framework));
        }

        let report = source_adapter.validate_native(native);
        for warning in report.warnings() {
            warnings.push(format!("{}: {}", warning.field_path, warning.message));
        }
        if !report.is_valid() {
            let errors = report
                .errors()
                .map(|issue| {
                    ChrysalisError::validation_at(issue.message.clone(), issue.field_path.clone())
                })
                .collect();
            return Ok(TranslationResult::failure(correlation, errors, warnings));
        }
        debug_assert!(report.issues.iter().all(|i| i.severity != Severity::Error));

        let canonical = source_adapter.to_canonical(native)?;
        let fidelity = canonical.metadata.fidelity_score;
        self.events.publish(Event::new(
            EventKind::AgentIngested,
            correlation,
            json!({
                "agent_id": canonical.id,
                "framework": native.framework,
                "fidelity": fidelity,
                "warning_count": canonical.metadata.warnings.len(),
            }),
        ));

        // Shadow outputs carry per-call key material, so they bypass the cache
        let use_cache = self.config.enable_cache && !opts.embed_shadow;
        let key = cache_key(native, target)?;
        if use_cache {
            if let Some(cached) = self.cache.get(&key) {
                self.events.publish(Event::new(
                    EventKind::AgentTranslated,
                    correlation,
                    json!({
                        "agent_id": cached.canonical.id,
                        "source": native.framework,
                        "target": target,
                        "fidelity": cached.fidelity_score,
                        "from_cache": true,
                    }),
                ));
                return Ok(TranslationResult {
                    success: true,
                    fidelity_score: cached.fidelity_score,
                    output: Some(cached.output),
                    canonical: Some(cached.canonical),
                    from_cache: true,
                    restoration_key: None,
                    errors: Vec::new(),
                    warnings: cached.warnings,
                    correlation_id: correlation,
                    duration_ms: 0,
                });
            }
        }

        if opts.persist.unwrap_or(self.config.auto_persist) {
            let snapshot = self
                .store
                .create_snapshot(
                    &canonical.id,
                    canonical.to_store_quads(),
                    SnapshotMeta::from_framework(native.framework.clone()).with_fidelity(fidelity),
                    None,
                )
                .await?;
            self.events.publish(Event::new(
                EventKind::AgentStored,
                correlation,
                json!({
                    "agent_id": snapshot.agent_id,
                    "version": snapshot.version,
                    "quads": snapshot.quads.len(),
                }),
            ));
        }

        if let Some(cancel) = &opts.cancel {
            cancel.check()?;
        }

        let (target_adapter, target_health) = self.registry.get(target)?;
        if target_health != chrysalis_adapters::HealthStatus::Healthy {
            warnings.push(format!("target adapter '{}' is degraded", target));
        }
        let mut output = target_adapter.from_canonical(&canonical)?;

        if fidelity < self.config.min_fidelity_score {
            warnings.push(format!(
                "fidelity {:.3} below configured minimum {:.3}",
                fidelity, self.config.min_fidelity_score
            ));
        }
        warnings.extend(canonical.metadata.warnings.iter().cloned());

        let mut restoration_key = None;
        if opts.embed_shadow {
            let (with_shadow, key) = chrysalis_shadow::build(
                source_adapter.as_ref(),
                target_adapter.as_ref(),
                native,
                &canonical,
                output,
                &self.signing,
                &self.config.crypto,
            )?;
            output = with_shadow;
            restoration_key = Some(key.encode());
        }

        if use_cache {
            self.cache.insert(
                key,
                CachedTranslation {
                    output: output.clone(),
                    canonical: canonical.clone(),
                    fidelity_score: fidelity,
                    warnings: warnings.clone(),
                },
            );
        }
        self.matrix.record(&native.framework, target, fidelity);

        self.events.publish(Event::new(
            EventKind::AgentTranslated,
            correlation,
            json!({
                "agent_id": canonical.id,
                "source": native.framework,
                "target": target,
                "fidelity": fidelity,
                "warning_count": warnings.len(),
                "duration_ms": pipeline_started.elapsed().as_millis() as u64,
                "from_cache": false,
            }),
        ));
        debug!(agent = %canonical.id, fidelity, "translation complete");

        Ok(TranslationResult {
            success: true,
            output: Some(output),
            canonical: Some(canonical),
            fidelity_score: fidelity,
            from_cache: false,
            restoration_key,
            errors: Vec::new(),
            warnings,
            correlation_id: correlation,
            duration_ms: 0,
        })
    }

    /// Ingest and persist a native agent, returning the created snapshot
    pub async fn store_agent(&self, native: &NativeAgent) -> Result<Snapshot> {
        self.ensure_live()?;
        let correlation = CorrelationId::new();
        let (adapter, _) = self.registry.get(&native.framework)?;

        let report = adapter.validate_native(native);
        if !report.is_valid() {
            let issue = report
                .errors()
                .next()
                .map(|i| (i.message.clone(), i.field_path.clone()))
                .unwrap_or_else(|| ("invalid agent".into(), String::new()));
            return Err(ChrysalisError::validation_at(issue.0, issue.1));
        }

        let canonical = adapter.to_canonical(native)?;
        let snapshot = self
            .store
            .create_snapshot(
                &canonical.id,
                canonical.to_store_quads(),
                SnapshotMeta::from_framework(native.framework.clone())
                    .with_fidelity(canonical.metadata.fidelity_score),
                None,
            )
            .await?;
        self.events.publish(Event::new(
            EventKind::AgentStored,
            correlation,
            json!({
                "agent_id": snapshot.agent_id,
                "version": snapshot.version,
                "quads": snapshot.quads.len(),
            }),
        ));
        Ok(snapshot)
    }

    /// Fetch an agent's current state, canonically or in a target shape
    pub async fn get_agent(
        &self,
        id: &AgentId,
        target: Option<&FrameworkTag>,
    ) -> Result<Option<GetAgentOutput>> {
        self.ensure_live()?;
        let Some(snapshot) = self.store.get_snapshot(id, SnapshotSelector::Latest).await? else {
            return Ok(None);
        };
        let canonical = CanonicalAgent::from_store_quads(
            id.clone(),
            snapshot.quads,
            snapshot.source_format,
        );
        match target {
            None => Ok(Some(GetAgentOutput::Canonical(canonical))),
            Some(tag) => {
                let (adapter, _) = self.registry.get(tag)?;
                Ok(Some(GetAgentOutput::Native(adapter.from_canonical(&canonical)?)))
            }
        }
    }

    /// Same-framework round trip with a structural diff
    pub async fn round_trip_test(&self, native: &NativeAgent) -> Result<RoundTripReport> {
        self.ensure_live()?;
        let (adapter, _) = self.registry.get(&native.framework)?;
        let canonical = adapter.to_canonical(native)?;
        let reconstructed = adapter.from_canonical(&canonical)?;
        let diff = diff_documents(&native.document, &reconstructed.document);
        Ok(RoundTripReport {
            original: native.clone(),
            fidelity_score: canonical.metadata.fidelity_score,
            canonical,
            reconstructed,
            diff,
        })
    }

    /// Translate a batch of agents to one target
    pub async fn batch_translate(&self, request: BatchRequest) -> Result<BatchResult> {
        self.ensure_live()?;
        let total = request.agents.len();
        let mut results = Vec::with_capacity(total);

        if request.parallel {
            let futures = request
                .agents
                .iter()
                .map(|agent| self.translate(agent, &request.target, TranslateOptions::default()));
            for outcome in futures::future::join_all(futures).await {
                results.push(outcome?);
            }
        } else {
            for agent in &request.agents {
                let result = self
                    .translate(agent, &request.target, TranslateOptions::default())
                    .await?;
                let failed = !result.success;
                results.push(result);
                if failed && !request.continue_on_error {
                    break;
                }
            }
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        let failed = results.iter().filter(|r| !r.success).count();
        Ok(BatchResult {
            total,
            succeeded,
            failed,
            results,
        })
    }

    /// Open a shadow embedded in a translated agent
    pub async fn open_shadow(
        &self,
        target: &NativeAgent,
        restoration_key: &str,
    ) -> Result<NativeAgent> {
        self.ensure_live()?;
        let (adapter, _) = self.registry.get(&target.framework)?;
        let key = RestorationKey::parse(restoration_key)?;
        chrysalis_shadow::open(
            target,
            adapter.as_ref(),
            &key,
            &self.signing.verifying_key(),
            &self.config.crypto,
        )
    }

    /// Discover stored agents by criteria
    pub async fn discover_agents(&self, criteria: &DiscoveryCriteria) -> Result<Vec<AgentSummary>> {
        self.ensure_live()?;
        self.store.discover_agents(criteria).await
    }

    /// List stored agents with pagination
    pub async fn list_agents(&self, limit: Option<usize>, offset: usize) -> Result<Vec<AgentSummary>> {
        self.ensure_live()?;
        let mut all = self.store.discover_agents(&DiscoveryCriteria::default()).await?;
        all.sort_by(|a, b| a.id.cmp(&b.id));
        let all: Vec<AgentSummary> = all.into_iter().skip(offset).collect();
        Ok(match limit {
            Some(limit) => all.into_iter().take(limit).collect(),
            None => all,
        })
    }

    /// Delete every version of an agent
    pub async fn delete_agent(&self, id: &AgentId) -> Result<bool> {
        self.ensure_live()?;
        let removed = self.store.delete_agent(id).await?;
        if removed {
            self.events.publish(Event::new(
                EventKind::AgentDeleted,
                CorrelationId::new(),
                json!({"agent_id": id}),
            ));
        }
        Ok(removed)
    }

    /// An agent's snapshot history
    pub async fn get_agent_history(&self, id: &AgentId) -> Result<Vec<Snapshot>> {
        self.ensure_live()?;
        self.store.get_history(id).await
    }

    /// Store-wide statistics
    pub async fn stats(&self) -> Result<StoreStats> {
        self.ensure_live()?;
        self.store.stats().await
    }

    /// Subscribe to events
    pub fn subscribe(&self, filter: SubscriptionFilter) -> tokio::sync::mpsc::Receiver<Event> {
        self.events.subscribe(filter)
    }

    /// Recent event history, oldest first
    pub fn event_history(&self, limit: usize) -> Vec<Event> {
        self.events.history(limit)
    }

    /// Drop all cached translations
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Fidelity averages per framework pair
    pub fn compatibility_matrix(&self) -> Vec<CompatibilityEntry> {
        self.matrix.entries()
    }

    /// Run adapter health checks on the configured interval
    ///
    /// The task exits on its own once the orchestrator is disposed.
    pub fn spawn_health_checker(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        let interval = Duration::from_millis(orchestrator.config.adapters.health_check_interval_ms);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if orchestrator.disposed.load(Ordering::SeqCst) {
                    break;
                }
                orchestrator.registry.run_health_checks();
            }
        })
    }

    /// Release the orchestrator and its components
    ///
    /// Idempotent; every later call fails with `Disposed`.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.store.dispose();
        self.events.dispose();
    }
}
