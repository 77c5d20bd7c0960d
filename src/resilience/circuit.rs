//! Circuit breaker for the remote directory dependency.
//!
//! Stops hammering a known-failing dependency for a cooldown window,
//! then allows a single controlled recovery probe.

use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{ExtractError, Result};
use crate::types::config::CircuitBreakerConfig;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation; calls pass through.
    Closed,
    /// Failing; calls are rejected until the recovery deadline.
    Open,
    /// Probing; one call is in flight to test recovery.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

type Classifier = Arc<dyn Fn(&ExtractError) -> bool + Send + Sync>;
type TripObserver = Arc<dyn Fn() + Send + Sync>;

struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    retry_at: Option<Instant>,
}

/// Internally synchronized circuit breaker.
///
/// One instance guards one dependency; state transitions happen only
/// through [`CircuitBreaker::guard`].
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
    classify: Classifier,
    on_trip: Option<TripObserver>,
}

impl CircuitBreaker {
    /// Create a breaker with the default classification (transient errors).
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                retry_at: None,
            }),
            classify: Arc::new(ExtractError::is_transient),
            on_trip: None,
        }
    }

    /// Replace the failure-classification predicate.
    ///
    /// Only failures matching the predicate count toward the threshold;
    /// everything else passes through without touching breaker state.
    pub fn with_classifier(
        mut self,
        classify: impl Fn(&ExtractError) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.classify = Arc::new(classify);
        self
    }

    /// Register a hook invoked each time the circuit trips open.
    pub fn with_trip_observer(mut self, observer: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_trip = Some(Arc::new(observer));
        self
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    /// Current consecutive-failure tally.
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().unwrap().failure_count
    }

    /// Run an operation under circuit protection.
    ///
    /// While open and within the recovery window this fails fast with
    /// `CircuitOpen` without invoking the operation. After the window
    /// elapses the state moves to half-open and the operation runs as a
    /// recovery probe: success closes the circuit, classified failure
    /// re-opens it with a fresh deadline.
    pub async fn guard<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.before_call()?;

        match op().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                if (self.classify)(&err) {
                    self.on_failure();
                }
                Err(err)
            }
        }
    }

    fn before_call(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == CircuitState::Open {
            let now = Instant::now();
            match inner.retry_at {
                Some(retry_at) if now < retry_at => {
                    return Err(ExtractError::CircuitOpen {
                        retry_in: retry_at - now,
                    });
                }
                _ => {
                    debug!("recovery timeout elapsed, permitting half-open probe");
                    inner.state = CircuitState::HalfOpen;
                }
            }
        }
        Ok(())
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != CircuitState::Closed {
            info!(from = %inner.state, "circuit closed after successful call");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.retry_at = None;
    }

    fn on_failure(&self) {
        let tripped = {
            let mut inner = self.inner.lock().unwrap();
            inner.failure_count += 1;
            if inner.failure_count >= self.config.failure_threshold
                && inner.state != CircuitState::Open
            {
                inner.state = CircuitState::Open;
                inner.retry_at = Some(Instant::now() + self.config.recovery_timeout);
                true
            } else {
                false
            }
        };

        if tripped {
            warn!(
                threshold = self.config.failure_threshold,
                recovery = ?self.config.recovery_timeout,
                "circuit opened"
            );
            if let Some(observer) = &self.on_trip {
                observer();
            }
        }
    }
}
