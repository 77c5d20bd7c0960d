//! Composition root wiring cache, rate limiter, circuit breaker, retry,
//! validation, and metrics into the extraction operations.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::cache::LayeredCache;
use crate::error::{ExtractError, Result};
use crate::metrics::{MetricsRecorder, MetricsSummary};
use crate::resilience::{backoff_delay, CircuitBreaker, CircuitState, TokenBucketRateLimiter};
use crate::traits::{Fetch, FetchTarget, RemoteCache, StoreProbe};
use crate::types::config::{OrchestratorConfig, RetryConfig};
use crate::types::record::{BatchOutcome, DeadLetterRecord};
use crate::types::report::{ComponentHealth, HealthReport};
use crate::validation::{DataQualityValidator, FieldRules};

/// Orchestrates resilient extraction against one data source.
///
/// Control flow for a request: cache, then rate limiter, then the
/// circuit breaker wrapping retried network calls, updating metrics
/// and cache on the way out.
pub struct ExtractionOrchestrator<F: Fetch> {
    fetcher: F,
    breaker: CircuitBreaker,
    limiter: TokenBucketRateLimiter,
    cache: LayeredCache,
    validator: DataQualityValidator,
    retry: RetryConfig,
    metrics: Arc<MetricsRecorder>,
    store: Option<Arc<dyn StoreProbe>>,
}

impl<F: Fetch> ExtractionOrchestrator<F> {
    /// Create an orchestrator with default configuration.
    pub fn new(fetcher: F) -> Self {
        Self::with_config(fetcher, OrchestratorConfig::default())
    }

    /// Create an orchestrator from explicit configuration.
    pub fn with_config(fetcher: F, config: OrchestratorConfig) -> Self {
        let metrics = Arc::new(MetricsRecorder::new());
        let trip_metrics = metrics.clone();
        let breaker = CircuitBreaker::new(config.circuit)
            .with_trip_observer(move || trip_metrics.record_circuit_trip());

        Self {
            fetcher,
            breaker,
            limiter: TokenBucketRateLimiter::new(config.rate_limit),
            cache: LayeredCache::new(config.cache),
            validator: DataQualityValidator::with_common_rules(),
            retry: config.retry,
            metrics,
            store: None,
        }
    }

    /// Attach a remote cache tier.
    pub fn with_remote_cache(mut self, remote: Arc<dyn RemoteCache>) -> Self {
        self.cache = self.cache.with_remote(remote);
        self
    }

    /// Attach a persistent-store probe for health reporting.
    pub fn with_store(mut self, store: Arc<dyn StoreProbe>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the validator (defaults to the common rules).
    pub fn with_validator(mut self, validator: DataQualityValidator) -> Self {
        self.validator = validator;
        self
    }

    /// The data-quality validator.
    pub fn validator(&self) -> &DataQualityValidator {
        &self.validator
    }

    /// Mutable access for registering domain rules.
    pub fn validator_mut(&mut self) -> &mut DataQualityValidator {
        &mut self.validator
    }

    /// The layered cache.
    pub fn cache(&self) -> &LayeredCache {
        &self.cache
    }

    /// The shared metrics recorder.
    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Current circuit state.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// The underlying data source.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch a target with caching, rate limiting, retries, and circuit
    /// protection.
    ///
    /// A cache hit short-circuits everything: no network, no rate
    /// limiting. On a miss the call acquires a rate-limit permit (held
    /// through every exit path), then retries through the circuit
    /// breaker with exponential backoff. A `CircuitOpen` rejection
    /// abandons the remaining attempts instead of sleeping them out.
    pub async fn robust_request(
        &self,
        target: &FetchTarget,
        cache_key: Option<&str>,
    ) -> Result<Value> {
        if let Some(key) = cache_key {
            if let Some(value) = self.cache.get(key).await {
                debug!(key, kind = %target.kind, "cache hit, skipping network");
                self.metrics.record_cache_hit();
                return Ok(value);
            }
            self.metrics.record_cache_miss();
        }

        let _permit = self.limiter.acquire().await;
        self.metrics.record_request();

        let mut last_err = None;
        for attempt in 0..self.retry.max_attempts {
            match self.breaker.guard(|| self.fetcher.fetch(target)).await {
                Ok(value) => {
                    if let Some(key) = cache_key {
                        self.cache.set(key, value.clone()).await;
                    }
                    self.metrics.record_success();
                    return Ok(value);
                }
                Err(err) if err.is_circuit_open() => {
                    warn!(kind = %target.kind, "circuit open, abandoning remaining attempts");
                    self.metrics.record_failure();
                    return Err(err);
                }
                Err(err) => {
                    if attempt + 1 < self.retry.max_attempts {
                        let delay = backoff_delay(&self.retry, attempt);
                        warn!(
                            kind = %target.kind,
                            attempt = attempt + 1,
                            delay = ?delay,
                            error = %err,
                            "request failed, retrying"
                        );
                        sleep(delay).await;
                    } else {
                        error!(
                            kind = %target.kind,
                            attempts = self.retry.max_attempts,
                            error = %err,
                            "request failed, retry budget exhausted"
                        );
                    }
                    last_err = Some(err);
                }
            }
        }

        self.metrics.record_failure();
        Err(last_err.unwrap_or(ExtractError::Config {
            reason: "retry budget allows zero attempts".into(),
        }))
    }

    /// Soft-validate then strictly decode a batch of raw records.
    ///
    /// Data-quality violations are logged and counted but do not block
    /// ingestion; decode failures quarantine the record into the
    /// dead-letter set with its original content and failure reason.
    /// One bad record never aborts the batch.
    pub fn validate_and_process_batch<T: DeserializeOwned>(
        &self,
        raw_records: Vec<Value>,
        field_rules: Option<&FieldRules>,
    ) -> BatchOutcome<T> {
        let mut outcome = BatchOutcome::empty();

        for raw in raw_records {
            if let Some(record) = raw.as_object() {
                let violations = self.validator.validate(record, field_rules);
                if !violations.is_empty() {
                    warn!(violations = ?violations, "data quality violations");
                    self.metrics.record_validation_error();
                }
            }

            match serde_json::from_value::<T>(raw.clone()) {
                Ok(record) => outcome.valid.push(record),
                Err(err) => {
                    error!(error = %err, "record failed strict decode, dead-lettering");
                    self.metrics.record_validation_error();
                    outcome
                        .dead_letters
                        .push(DeadLetterRecord::new(raw, err.to_string()));
                }
            }
        }

        outcome
    }

    /// Run independent extraction tasks under a concurrency gate.
    ///
    /// Tasks beyond the gate queue in submission order and start as
    /// slots free. One task's failure is isolated from its siblings.
    /// The returned vector is index-aligned with the submitted tasks,
    /// regardless of completion order.
    pub async fn concurrent_extract<T, Task, Fut>(
        &self,
        tasks: Vec<Task>,
        max_concurrent: usize,
    ) -> Vec<Result<T>>
    where
        Task: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let gate = Arc::new(Semaphore::new(max_concurrent.max(1)));

        let bounded = tasks.into_iter().map(|task| {
            let gate = gate.clone();
            async move {
                let _slot = gate
                    .acquire_owned()
                    .await
                    .expect("fan-out semaphore closed");
                task().await
            }
        });

        let results = join_all(bounded).await;

        for result in &results {
            match result {
                Ok(_) => self.metrics.record_success(),
                Err(err) => {
                    error!(error = %err, "concurrent extraction task failed");
                    self.metrics.record_failure();
                }
            }
        }

        results
    }

    /// Current metrics with derived rates. Pure read; never mutates.
    pub fn get_metrics_summary(&self) -> MetricsSummary {
        self.metrics.summary(self.breaker.state())
    }

    /// Probe downstream dependencies and aggregate a health report.
    ///
    /// Probes run independently; one failing dependency never skips the
    /// others. Aggregate is healthy only if every probe succeeds and
    /// the circuit is closed; the worst aggregate is degraded.
    pub async fn health_check(&self) -> HealthReport {
        let mut components = BTreeMap::new();

        components.insert(
            "source".to_string(),
            match self.fetcher.probe().await {
                Ok(()) => ComponentHealth::Healthy,
                Err(err) => ComponentHealth::unhealthy(err),
            },
        );

        if let Some(store) = &self.store {
            components.insert(
                "store".to_string(),
                match store.ping().await {
                    Ok(()) => ComponentHealth::Healthy,
                    Err(err) => ComponentHealth::unhealthy(err),
                },
            );
        }

        if let Some(remote) = self.cache.remote() {
            components.insert(
                "remote_cache".to_string(),
                match remote.ping().await {
                    Ok(()) => ComponentHealth::Healthy,
                    Err(err) => ComponentHealth::unhealthy(err),
                },
            );
        }

        let circuit = self.breaker.state();
        components.insert(
            "circuit_breaker".to_string(),
            if circuit == CircuitState::Closed {
                ComponentHealth::Healthy
            } else {
                ComponentHealth::unhealthy(format!("circuit {circuit}"))
            },
        );

        let status = HealthReport::aggregate(&components);
        HealthReport {
            status,
            timestamp: Utc::now(),
            components,
            metrics: self.get_metrics_summary(),
        }
    }
}
