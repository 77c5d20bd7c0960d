//! Operational metrics for extraction runs.
//!
//! Counters are atomic so every concurrent caller can record outcomes
//! without locks; they only ever increase. The recorder stays queryable
//! after failures for postmortem analysis.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::resilience::circuit::CircuitState;

/// Shared counters mutated by every in-flight call.
#[derive(Debug)]
pub struct MetricsRecorder {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    validation_errors: AtomicU64,
    circuit_trips: AtomicU64,
    started_at: Instant,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    /// Create a recorder; the start instant anchors throughput rates.
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            validation_errors: AtomicU64::new(0),
            circuit_trips: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_error(&self) {
        self.validation_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_circuit_trip(&self) {
        self.circuit_trips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn validation_errors(&self) -> u64 {
        self.validation_errors.load(Ordering::Relaxed)
    }

    pub fn circuit_trips(&self) -> u64 {
        self.circuit_trips.load(Ordering::Relaxed)
    }

    /// Produce a summary with derived rates. Pure read; never mutates.
    pub fn summary(&self, circuit_state: CircuitState) -> MetricsSummary {
        let total = self.total_requests.load(Ordering::Relaxed);
        let successful = self.successful_requests.load(Ordering::Relaxed);
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let runtime = self.started_at.elapsed().as_secs_f64();

        let pct = |part: u64, whole: u64| {
            if whole == 0 {
                0.0
            } else {
                part as f64 / whole as f64 * 100.0
            }
        };

        MetricsSummary {
            runtime_seconds: runtime,
            total_requests: total,
            successful_requests: successful,
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            success_rate_percent: pct(successful, total),
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate_percent: pct(hits, hits + misses),
            validation_errors: self.validation_errors.load(Ordering::Relaxed),
            circuit_trips: self.circuit_trips.load(Ordering::Relaxed),
            circuit_state,
            requests_per_second: if runtime > 0.0 {
                total as f64 / runtime
            } else {
                0.0
            },
        }
    }
}

/// Point-in-time metrics snapshot with derived rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub runtime_seconds: f64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate_percent: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate_percent: f64,
    pub validation_errors: u64,
    pub circuit_trips: u64,
    pub circuit_state: CircuitState,
    pub requests_per_second: f64,
}
