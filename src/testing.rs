//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the framework
//! without a real directory service, cache service, or database.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::{ExtractError, Result};
use crate::traits::{Fetch, FetchTarget, RemoteCache, StoreProbe};

enum ScriptedResponse {
    Ok(Value),
    Transient(String),
}

/// A mock data source with scripted responses and call recording.
///
/// Responses are queued per resource kind and consumed in order; an
/// exhausted queue falls back to the default response, or a transient
/// failure if none is set.
#[derive(Default)]
pub struct MockFetch {
    scripts: RwLock<HashMap<String, VecDeque<ScriptedResponse>>>,
    default_response: RwLock<Option<Value>>,
    calls: RwLock<Vec<FetchTarget>>,
    probe_ok: AtomicBool,
}

impl MockFetch {
    /// Create a mock source with a healthy probe and no scripted responses.
    pub fn new() -> Self {
        let mock = Self::default();
        mock.probe_ok.store(true, Ordering::SeqCst);
        mock
    }

    /// Queue a successful response for a resource kind.
    pub fn with_response(self, kind: impl Into<String>, value: Value) -> Self {
        self.scripts
            .write()
            .unwrap()
            .entry(kind.into())
            .or_default()
            .push_back(ScriptedResponse::Ok(value));
        self
    }

    /// Queue a transient failure for a resource kind.
    pub fn with_transient_failure(self, kind: impl Into<String>, reason: impl Into<String>) -> Self {
        self.scripts
            .write()
            .unwrap()
            .entry(kind.into())
            .or_default()
            .push_back(ScriptedResponse::Transient(reason.into()));
        self
    }

    /// Set the fallback response for unscripted calls.
    pub fn with_default_response(self, value: Value) -> Self {
        *self.default_response.write().unwrap() = Some(value);
        self
    }

    /// Make the health probe fail.
    pub fn with_failed_probe(self) -> Self {
        self.probe_ok.store(false, Ordering::SeqCst);
        self
    }

    /// Toggle probe health at runtime.
    pub fn set_probe_ok(&self, ok: bool) {
        self.probe_ok.store(ok, Ordering::SeqCst);
    }

    /// All fetch calls made so far, in order.
    pub fn calls(&self) -> Vec<FetchTarget> {
        self.calls.read().unwrap().clone()
    }

    /// Number of fetch calls for a resource kind.
    pub fn call_count(&self, kind: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|t| t.kind == kind)
            .count()
    }
}

#[async_trait]
impl Fetch for MockFetch {
    async fn fetch(&self, target: &FetchTarget) -> Result<Value> {
        self.calls.write().unwrap().push(target.clone());

        let scripted = self
            .scripts
            .write()
            .unwrap()
            .get_mut(&target.kind)
            .and_then(VecDeque::pop_front);

        match scripted {
            Some(ScriptedResponse::Ok(value)) => Ok(value),
            Some(ScriptedResponse::Transient(reason)) => Err(ExtractError::Transient { reason }),
            None => match self.default_response.read().unwrap().clone() {
                Some(value) => Ok(value),
                None => Err(ExtractError::transient(format!(
                    "no scripted response for kind '{}'",
                    target.kind
                ))),
            },
        }
    }

    async fn probe(&self) -> Result<()> {
        if self.probe_ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ExtractError::transient("probe failure injected"))
        }
    }
}

/// In-memory remote cache with TTL semantics and failure injection.
#[derive(Default)]
pub struct MemoryRemoteCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
    fail: AtomicBool,
    fail_ping: AtomicBool,
}

impl MemoryRemoteCache {
    /// Create an empty, healthy cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read and write fail.
    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    /// Make only the health ping fail.
    pub fn with_failed_ping(self) -> Self {
        self.fail_ping.store(true, Ordering::SeqCst);
        self
    }

    /// Toggle read/write failure at runtime.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    /// Number of stored entries (including expired ones not yet reaped).
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RemoteCache for MemoryRemoteCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExtractError::Cache("injected cache failure".into()));
        }
        let mut entries = self.entries.write().unwrap();
        match entries.get(key) {
            Some((value, expires_at)) if Instant::now() < *expires_at => {
                Ok(Some(value.clone()))
            }
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExtractError::Cache("injected cache failure".into()));
        }
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) || self.fail_ping.load(Ordering::SeqCst) {
            Err(ExtractError::Cache("injected ping failure".into()))
        } else {
            Ok(())
        }
    }
}

/// Store probe with a toggleable outcome.
#[derive(Default)]
pub struct MockStoreProbe {
    ok: AtomicBool,
}

impl MockStoreProbe {
    /// Create a healthy probe.
    pub fn new() -> Self {
        let probe = Self::default();
        probe.ok.store(true, Ordering::SeqCst);
        probe
    }

    /// Create a failing probe.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Toggle the probe outcome.
    pub fn set_ok(&self, ok: bool) {
        self.ok.store(ok, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreProbe for MockStoreProbe {
    async fn ping(&self) -> Result<()> {
        if self.ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ExtractError::Store("injected store failure".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_fetch_scripted_order() {
        let mock = MockFetch::new()
            .with_transient_failure("schools", "503")
            .with_response("schools", json!([{"id": 1}]));

        let target = FetchTarget::new("schools");
        assert!(mock.fetch(&target).await.is_err());
        assert_eq!(mock.fetch(&target).await.unwrap(), json!([{"id": 1}]));
        assert_eq!(mock.call_count("schools"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_remote_cache_honors_ttl() {
        let cache = MemoryRemoteCache::new();
        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
