//! Exponential backoff computation for the retry loop.

use std::time::Duration;

use crate::types::config::RetryConfig;

/// Delay before the retry following failed attempt `attempt` (0-based).
///
/// Computes `min(base_delay * backoff_base^attempt, max_delay)`, then
/// multiplies by a uniform factor in [0.5, 1.0) when jitter is enabled.
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exp = config.backoff_base.powi(attempt as i32);
    let mut delay = config.base_delay.as_secs_f64() * exp;
    delay = delay.min(config.max_delay.as_secs_f64());

    if config.jitter {
        delay *= 0.5 + fastrand::f64() * 0.5;
    }

    Duration::from_secs_f64(delay)
}
