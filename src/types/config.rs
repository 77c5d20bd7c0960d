//! Configuration types for the resilience components and the orchestrator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the circuit breaker.
///
/// The failure-classification predicate lives on the breaker itself
/// (see `CircuitBreaker::with_classifier`) so this stays serializable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive classified failures before the circuit opens.
    pub failure_threshold: u32,

    /// How long the circuit stays open before permitting a recovery probe.
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a config with the given threshold and recovery timeout.
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
        }
    }
}

/// Configuration for the layered cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for entries in the local tier.
    pub local_ttl: Duration,

    /// Time-to-live for entries written to the remote tier.
    pub remote_ttl: Duration,

    /// Maximum number of entries held in the local tier.
    pub max_local_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_ttl: Duration::from_secs(300),
            remote_ttl: Duration::from_secs(3600),
            max_local_entries: 1000,
        }
    }
}

impl CacheConfig {
    /// Set the local tier TTL.
    pub fn with_local_ttl(mut self, ttl: Duration) -> Self {
        self.local_ttl = ttl;
        self
    }

    /// Set the remote tier TTL.
    pub fn with_remote_ttl(mut self, ttl: Duration) -> Self {
        self.remote_ttl = ttl;
        self
    }

    /// Set the local tier capacity.
    pub fn with_max_local_entries(mut self, max: usize) -> Self {
        self.max_local_entries = max;
        self
    }
}

/// Configuration for the token-bucket rate limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained admission rate in requests per second.
    pub requests_per_second: f64,

    /// Maximum burst of requests admitted without delay.
    pub burst_capacity: u32,

    /// Maximum number of concurrently admitted requests.
    pub max_concurrent: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10.0,
            burst_capacity: 20,
            max_concurrent: 5,
        }
    }
}

impl RateLimitConfig {
    /// Set the sustained rate.
    pub fn with_requests_per_second(mut self, rps: f64) -> Self {
        self.requests_per_second = rps;
        self
    }

    /// Set the burst capacity.
    pub fn with_burst_capacity(mut self, burst: u32) -> Self {
        self.burst_capacity = burst;
        self
    }

    /// Set the concurrency limit.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }
}

/// Configuration for retry with exponential backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Base delay before the first retry.
    pub base_delay: Duration,

    /// Ceiling applied to any computed delay.
    pub max_delay: Duration,

    /// Exponential growth factor between attempts.
    pub backoff_base: f64,

    /// Multiply each delay by a uniform factor in [0.5, 1.0).
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Set the attempt budget.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the delay ceiling.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Disable jitter (useful for deterministic tests).
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }
}

/// Bundled configuration for the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Circuit breaker settings.
    #[serde(default)]
    pub circuit: CircuitBreakerConfig,

    /// Layered cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Rate limiter settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry/backoff settings.
    #[serde(default)]
    pub retry: RetryConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = OrchestratorConfig::default();
        assert!(config.circuit.failure_threshold > 0);
        assert!(config.rate_limit.requests_per_second > 0.0);
        assert!(config.retry.max_attempts > 0);
        assert!(config.cache.max_local_entries > 0);
    }

    #[test]
    fn test_builder_chaining() {
        let retry = RetryConfig::default()
            .with_max_attempts(5)
            .with_base_delay(Duration::from_millis(200))
            .without_jitter();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.base_delay, Duration::from_millis(200));
        assert!(!retry.jitter);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = OrchestratorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: OrchestratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.circuit.failure_threshold,
            config.circuit.failure_threshold
        );
        assert_eq!(back.cache.local_ttl, config.cache.local_ttl);
    }
}
