//! Health reporting types for the observability surface.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::MetricsSummary;

/// Overall health of the extraction pipeline.
///
/// There is deliberately no terminal `failed` status: even with every
/// dependency unreachable the pipeline keeps serving cached data and
/// metrics, so the worst aggregate is `degraded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Health of a single probed dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ComponentHealth {
    Healthy,
    Unhealthy { detail: String },
}

impl ComponentHealth {
    /// Build an unhealthy entry from a probe error.
    pub fn unhealthy(detail: impl std::fmt::Display) -> Self {
        Self::Unhealthy {
            detail: detail.to_string(),
        }
    }

    /// Whether this component passed its probe.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Structured health report, produced fresh on every check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Aggregate status across all components.
    pub status: HealthStatus,

    /// When the report was produced.
    pub timestamp: DateTime<Utc>,

    /// Per-dependency probe results.
    pub components: BTreeMap<String, ComponentHealth>,

    /// Metrics snapshot taken alongside the probes.
    pub metrics: MetricsSummary,
}

impl HealthReport {
    /// Aggregate the component map into an overall status.
    ///
    /// Healthy only when every component passed its probe.
    pub fn aggregate(components: &BTreeMap<String, ComponentHealth>) -> HealthStatus {
        if components.values().all(ComponentHealth::is_healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_all_healthy() {
        let mut components = BTreeMap::new();
        components.insert("store".to_string(), ComponentHealth::Healthy);
        components.insert("remote_cache".to_string(), ComponentHealth::Healthy);
        assert_eq!(HealthReport::aggregate(&components), HealthStatus::Healthy);
    }

    #[test]
    fn test_aggregate_degrades_on_any_failure() {
        let mut components = BTreeMap::new();
        components.insert("store".to_string(), ComponentHealth::Healthy);
        components.insert(
            "remote_cache".to_string(),
            ComponentHealth::unhealthy("connection refused"),
        );
        assert_eq!(HealthReport::aggregate(&components), HealthStatus::Degraded);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }
}
