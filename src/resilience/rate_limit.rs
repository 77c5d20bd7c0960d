//! Token-bucket rate limiter with bounded concurrency.
//!
//! Bounds both sustained throughput (protects the remote service) and
//! local concurrency (protects local resources). Never rejects: callers
//! are delayed until a token is available, then always admitted.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::types::config::RateLimitConfig;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Scoped admission to the rate limiter.
///
/// Dropping the permit frees the concurrency slot, so release happens
/// exactly once on every exit path.
pub struct RatePermit {
    _permit: OwnedSemaphorePermit,
}

/// Token-bucket limiter over a FIFO concurrency semaphore.
pub struct TokenBucketRateLimiter {
    config: RateLimitConfig,
    semaphore: Arc<Semaphore>,
    bucket: Mutex<Bucket>,
}

impl TokenBucketRateLimiter {
    /// Create a limiter; the bucket starts full at burst capacity.
    pub fn new(config: RateLimitConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
        let bucket = Mutex::new(Bucket {
            tokens: config.burst_capacity as f64,
            last_refill: Instant::now(),
        });
        Self {
            config,
            semaphore,
            bucket,
        }
    }

    /// Wait for a concurrency slot, then for a token.
    ///
    /// Tokens refill at `requests_per_second`, capped at the burst
    /// capacity. When the bucket is empty the caller sleeps out the
    /// deficit instead of being rejected.
    pub async fn acquire(&self) -> RatePermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("rate limiter semaphore closed");

        let wait = {
            let mut bucket = self.bucket.lock().unwrap();
            let now = Instant::now();
            let elapsed = (now - bucket.last_refill).as_secs_f64();
            bucket.last_refill = now;

            let rate = self.config.requests_per_second;
            bucket.tokens =
                (bucket.tokens + elapsed * rate).min(self.config.burst_capacity as f64);

            if bucket.tokens < 1.0 {
                let deficit = Duration::from_secs_f64((1.0 - bucket.tokens) / rate);
                bucket.tokens = 0.0;
                // The slept-out interval pays for this admission; advancing the
                // refill marker keeps it from also crediting the next caller.
                bucket.last_refill = now + deficit;
                Some(deficit)
            } else {
                bucket.tokens -= 1.0;
                None
            }
        };

        if let Some(wait) = wait {
            debug!(wait = ?wait, "rate limiter delaying request");
            sleep(wait).await;
        }

        RatePermit { _permit: permit }
    }

    /// Free concurrency slots (for observability and tests).
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }
}
