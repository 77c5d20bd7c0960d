//! Data-source capability trait and request descriptor.
//!
//! Sources are injected into the orchestrator rather than subclassed:
//! anything that can fetch a target and answer a health probe works.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::key::derive_cache_key;
use crate::error::Result;

/// A parameterized request against a data source.
///
/// Two targets with the same kind and the same parameter set are the
/// same request regardless of parameter insertion order; `cache_key`
/// canonicalizes before hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTarget {
    /// Resource kind, used as the request path and the cache key prefix.
    pub kind: String,

    /// Query parameters as name/value pairs.
    #[serde(default)]
    pub params: Vec<(String, String)>,
}

impl FetchTarget {
    /// Create a target for a resource kind with no parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Vec::new(),
        }
    }

    /// Add a query parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Deterministic cache key for this target.
    pub fn cache_key(&self) -> String {
        derive_cache_key(&self.kind, &self.params)
    }
}

/// Capability interface for a remote data source.
///
/// Implementations perform the actual network call; the orchestrator
/// wraps them in caching, rate limiting, retries, and circuit breaking.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch a target and return its decoded JSON body.
    ///
    /// Bodies must be JSON objects or arrays; no other encoding is
    /// supported.
    async fn fetch(&self, target: &FetchTarget) -> Result<Value>;

    /// Lightweight reachability probe for health reporting.
    async fn probe(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_builder() {
        let target = FetchTarget::new("schools")
            .with_param("division", 1)
            .with_param("sport", "basketball");
        assert_eq!(target.kind, "schools");
        assert_eq!(target.params.len(), 2);
    }

    #[test]
    fn test_cache_key_ignores_param_order() {
        let a = FetchTarget::new("schools")
            .with_param("division", 1)
            .with_param("sport", 2);
        let b = FetchTarget::new("schools")
            .with_param("sport", 2)
            .with_param("division", 1);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_distinguishes_kinds() {
        let a = FetchTarget::new("schools").with_param("division", 1);
        let b = FetchTarget::new("conferences").with_param("division", 1);
        assert_ne!(a.cache_key(), b.cache_key());
    }
}
