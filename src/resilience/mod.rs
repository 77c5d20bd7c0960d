//! Resilience primitives: circuit breaking, rate limiting, backoff.

pub mod circuit;
pub mod rate_limit;
pub mod retry;

pub use circuit::{CircuitBreaker, CircuitState};
pub use rate_limit::{RatePermit, TokenBucketRateLimiter};
pub use retry::backoff_delay;
