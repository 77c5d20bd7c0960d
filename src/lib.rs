//! Resilient Directory Extraction Framework
//!
//! Pulls paginated, parameterized records from a remote HTTP directory
//! service under load constraints it does not control, tolerating
//! partial outages, transient slowness, and malformed records.
//!
//! # Design
//!
//! The framework composes small, internally synchronized components:
//!
//! - Circuit breaker: stops invoking a known-failing dependency for a
//!   cooldown window, with a single controlled recovery probe
//! - Token-bucket rate limiter: bounds sustained throughput and local
//!   concurrency; delays callers but never rejects them
//! - Layered cache: fast local tier plus a shared remote tier, with
//!   write-through population on remote hits
//! - Retry with exponential backoff and jitter
//! - Rule-based data-quality validation with dead-letter quarantine
//!   for records failing strict decode
//! - Metrics and a structured health report
//!
//! The orchestrator wires them together; data sources are injected as
//! capability traits rather than subclassed.
//!
//! # Usage
//!
//! ```rust,ignore
//! use directory_extraction::{
//!     DirectoryClient, DirectorySource, ExtractionOrchestrator, FetchTarget,
//! };
//!
//! let client = DirectoryClient::new("https://directory.example.org/api")?;
//! let source = DirectorySource::new(ExtractionOrchestrator::new(client));
//!
//! let target = FetchTarget::new("schools").with_param("division", 1);
//! let records = source.extract(&target).await?;
//!
//! let health = source.orchestrator().health_check().await;
//! let metrics = source.orchestrator().get_metrics_summary();
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (Fetch, RemoteCache, StoreProbe)
//! - [`types`] - Configuration, record, and report types
//! - [`resilience`] - Circuit breaker, rate limiter, backoff
//! - [`cache`] - Layered cache and key derivation
//! - [`validation`] - Rule-based data-quality validation
//! - [`orchestrator`] - Composition root
//! - [`sources`] - Directory service client and typed extraction layer
//! - [`testing`] - Mock implementations for testing

pub mod cache;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod resilience;
pub mod sources;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export core types at crate root
pub use error::{ExtractError, Result};
pub use traits::{Fetch, FetchTarget, RemoteCache, StoreProbe};
pub use types::{
    config::{
        CacheConfig, CircuitBreakerConfig, OrchestratorConfig, RateLimitConfig, RetryConfig,
    },
    record::{BatchOutcome, DeadLetterRecord},
    report::{ComponentHealth, HealthReport, HealthStatus},
};

// Re-export resilience components
pub use resilience::{backoff_delay, CircuitBreaker, CircuitState, TokenBucketRateLimiter};

// Re-export cache layer
pub use cache::{derive_cache_key, HttpKvCache, LayeredCache};

// Re-export validation
pub use validation::{
    DataQualityValidator, FieldRules, Severity, ValidationRule, Violation, ViolationMap,
};

// Re-export metrics
pub use metrics::{MetricsRecorder, MetricsSummary};

// Re-export the orchestrator
pub use orchestrator::ExtractionOrchestrator;

// Re-export sources
pub use sources::{records_from_body, DirectoryClient, DirectorySource};

#[cfg(feature = "postgres")]
pub use stores::PgStoreProbe;
