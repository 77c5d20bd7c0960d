//! Data types for configuration, records, and health reporting.

pub mod config;
pub mod record;
pub mod report;

pub use config::{
    CacheConfig, CircuitBreakerConfig, OrchestratorConfig, RateLimitConfig, RetryConfig,
};
pub use record::{BatchOutcome, DeadLetterRecord};
pub use report::{ComponentHealth, HealthReport, HealthStatus};
