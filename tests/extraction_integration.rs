//! Integration tests for the resilient extraction pipeline.
//!
//! These exercise the composed behavior: caching, rate limiting, the
//! circuit breaker inside the retry loop, batch validation with dead
//! letters, concurrent fan-out, and health/metrics reporting.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tokio::time::Instant;

use directory_extraction::{
    testing::{MemoryRemoteCache, MockFetch, MockStoreProbe},
    BatchOutcome, CircuitBreakerConfig, CircuitState, DirectorySource, ExtractionOrchestrator,
    FetchTarget, FieldRules, HealthStatus, OrchestratorConfig, RetryConfig,
};

#[derive(Debug, Deserialize)]
struct Member {
    id: u32,
    name: String,
}

fn fast_retry() -> RetryConfig {
    RetryConfig::default()
        .with_base_delay(Duration::from_millis(100))
        .without_jitter()
}

fn config_with_circuit(threshold: u32, recovery: Duration) -> OrchestratorConfig {
    OrchestratorConfig {
        circuit: CircuitBreakerConfig::new(threshold, recovery),
        retry: fast_retry().with_max_attempts(1),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_circuit_scenario_threshold_three_recovery_sixty() {
    let orch = ExtractionOrchestrator::with_config(
        MockFetch::new(),
        config_with_circuit(3, Duration::from_secs(60)),
    );
    let target = FetchTarget::new("schools");

    // Three consecutive failing calls open the circuit.
    for _ in 0..3 {
        let err = orch.robust_request(&target, None).await.unwrap_err();
        assert!(err.is_transient() || err.is_circuit_open());
    }
    assert_eq!(orch.circuit_state(), CircuitState::Open);
    assert_eq!(orch.fetcher().call_count("schools"), 3);

    // At t=10s the call fails immediately without touching the network.
    tokio::time::advance(Duration::from_secs(10)).await;
    let err = orch.robust_request(&target, None).await.unwrap_err();
    assert!(err.is_circuit_open());
    assert_eq!(orch.fetcher().call_count("schools"), 3);

    // At t=61s exactly one half-open probe is permitted.
    tokio::time::advance(Duration::from_secs(51)).await;
    let _ = orch.robust_request(&target, None).await;
    assert_eq!(orch.fetcher().call_count("schools"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_success_closes_circuit_end_to_end() {
    let mock = MockFetch::new()
        .with_transient_failure("schools", "503")
        .with_transient_failure("schools", "503")
        .with_response("schools", json!([{"id": 1}]));
    let orch =
        ExtractionOrchestrator::with_config(mock, config_with_circuit(2, Duration::from_secs(30)));
    let target = FetchTarget::new("schools");

    orch.robust_request(&target, None).await.unwrap_err();
    orch.robust_request(&target, None).await.unwrap_err();
    assert_eq!(orch.circuit_state(), CircuitState::Open);

    tokio::time::advance(Duration::from_secs(31)).await;
    let value = orch.robust_request(&target, None).await.unwrap();
    assert_eq!(value, json!([{"id": 1}]));
    assert_eq!(orch.circuit_state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_cache_scenario_local_ttl_five_seconds() {
    let config = OrchestratorConfig {
        cache: directory_extraction::CacheConfig::default()
            .with_local_ttl(Duration::from_secs(5)),
        retry: fast_retry(),
        ..Default::default()
    };
    let mock = MockFetch::new().with_default_response(json!({"value": "v"}));
    let orch = ExtractionOrchestrator::with_config(mock, config);
    let target = FetchTarget::new("lookup");

    orch.robust_request(&target, Some("k")).await.unwrap();
    assert_eq!(orch.fetcher().call_count("lookup"), 1);

    // t=2s: still cached.
    tokio::time::advance(Duration::from_secs(2)).await;
    orch.robust_request(&target, Some("k")).await.unwrap();
    assert_eq!(orch.fetcher().call_count("lookup"), 1);

    // t=6s: expired, refetched.
    tokio::time::advance(Duration::from_secs(4)).await;
    orch.robust_request(&target, Some("k")).await.unwrap();
    assert_eq!(orch.fetcher().call_count("lookup"), 2);

    let summary = orch.get_metrics_summary();
    assert_eq!(summary.cache_hits, 1);
    assert_eq!(summary.cache_misses, 2);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_consumes_exact_attempt_budget() {
    let config = OrchestratorConfig {
        retry: fast_retry(),
        ..Default::default()
    };
    let mock = MockFetch::new()
        .with_transient_failure("schools", "503")
        .with_transient_failure("schools", "503")
        .with_response("schools", json!([]));
    let orch = ExtractionOrchestrator::with_config(mock, config);

    let start = Instant::now();
    orch.robust_request(&FetchTarget::new("schools"), None)
        .await
        .unwrap();
    let elapsed = Instant::now() - start;

    assert_eq!(orch.fetcher().call_count("schools"), 3);
    // Two backoff sleeps: 100ms and 200ms, no jitter.
    assert!(elapsed >= Duration::from_millis(300), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(350), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_batch_pipeline_with_dead_letters_and_rules() {
    let orch = ExtractionOrchestrator::with_config(
        MockFetch::new(),
        OrchestratorConfig {
            retry: fast_retry(),
            ..Default::default()
        },
    );

    let mut rules = FieldRules::new();
    rules.insert("name".to_string(), vec!["not_empty".to_string()]);
    rules.insert("id".to_string(), vec!["positive_number".to_string()]);

    let raw = vec![
        json!({"id": 1, "name": "Saint Olaf College"}),
        json!({"id": 2, "name": ""}),
        json!({"id": "seven", "name": "Bad Id"}),
    ];

    let outcome: BatchOutcome<Member> = orch.validate_and_process_batch(raw, Some(&rules));

    assert_eq!(outcome.valid.len(), 2);
    assert_eq!(outcome.dead_letters.len(), 1);
    assert_eq!(outcome.dead_letters[0].record["name"], "Bad Id");

    // Two soft violations (empty name, non-numeric id) plus one hard
    // decode failure.
    assert_eq!(orch.metrics().validation_errors(), 3);
}

#[tokio::test]
async fn test_fan_out_with_remote_cache_and_health() {
    let remote = Arc::new(MemoryRemoteCache::new());
    let mock = MockFetch::new()
        .with_response("schools", json!({"schools": [{"id": 1}, {"id": 2}]}))
        .with_response("conferences", json!({"conferences": [{"id": 5}]}));

    let config = OrchestratorConfig {
        retry: fast_retry().with_max_attempts(1),
        ..Default::default()
    };
    let source = DirectorySource::new(
        ExtractionOrchestrator::with_config(mock, config)
            .with_remote_cache(remote.clone())
            .with_store(Arc::new(MockStoreProbe::new())),
    );

    let results = source
        .extract_many(
            vec![FetchTarget::new("schools"), FetchTarget::new("conferences")],
            2,
        )
        .await;
    assert_eq!(results[0].as_ref().unwrap().len(), 2);
    assert_eq!(results[1].as_ref().unwrap().len(), 1);

    // Successful fetches were written through to the remote tier.
    assert_eq!(remote.len(), 2);

    let report = source.orchestrator().health_check().await;
    assert_eq!(report.status, HealthStatus::Healthy);
    assert!(report.components.contains_key("remote_cache"));
    assert!(report.components.contains_key("store"));
}

#[tokio::test]
async fn test_metrics_queryable_after_failures() {
    let orch = ExtractionOrchestrator::with_config(
        MockFetch::new().with_failed_probe(),
        OrchestratorConfig {
            retry: fast_retry().with_max_attempts(1),
            ..Default::default()
        },
    );

    for _ in 0..3 {
        orch.robust_request(&FetchTarget::new("schools"), None)
            .await
            .unwrap_err();
    }

    let report = orch.health_check().await;
    assert_eq!(report.status, HealthStatus::Degraded);
    assert!(!report.components["source"].is_healthy());

    let summary = report.metrics;
    assert_eq!(summary.total_requests, 3);
    assert_eq!(summary.failed_requests, 3);
    assert_eq!(summary.success_rate_percent, 0.0);
}

#[tokio::test]
async fn test_health_report_serializes_for_monitoring() {
    let orch = ExtractionOrchestrator::with_config(
        MockFetch::new(),
        OrchestratorConfig {
            retry: fast_retry(),
            ..Default::default()
        },
    );

    let report = orch.health_check().await;
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["status"], "healthy");
    assert_eq!(value["components"]["source"]["status"], "healthy");
    assert!(value["metrics"]["total_requests"].is_u64());
}
