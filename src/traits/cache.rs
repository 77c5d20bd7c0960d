//! Remote cache trait for the shared tier of the layered cache.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// A network key-value store with expiring writes.
///
/// Treated as a soft dependency: unavailability degrades performance,
/// never correctness. Callers log failures and carry on.
#[async_trait]
pub trait RemoteCache: Send + Sync {
    /// Get a serialized value by key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a serialized value with a time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Reachability probe for health reporting.
    async fn ping(&self) -> Result<()>;
}
