//! Typed errors for the extraction framework.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during extraction operations.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Transient network failure; retryable and counted by the circuit breaker.
    #[error("transient network error: {reason}")]
    Transient { reason: String },

    /// Circuit breaker is open; the call failed fast without touching the network.
    ///
    /// Does not itself count toward the breaker's failure tally.
    #[error("circuit open, retry in {retry_in:?}")]
    CircuitOpen { retry_in: Duration },

    /// Record failed strict schema decoding; quarantined to the dead-letter set.
    #[error("schema decode failed: {reason}")]
    Schema { reason: String },

    /// Remote cache operation failed.
    ///
    /// The cache is a soft dependency; callers log and continue.
    #[error("remote cache error: {0}")]
    Cache(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Persistent store unreachable.
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid URL for the directory service.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error.
    #[error("config error: {reason}")]
    Config { reason: String },
}

impl ExtractError {
    /// Build a transient error from any displayable cause.
    pub fn transient(reason: impl std::fmt::Display) -> Self {
        Self::Transient {
            reason: reason.to_string(),
        }
    }

    /// Whether this failure is retryable and should count against the breaker.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Whether this failure is a fail-fast circuit rejection.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
