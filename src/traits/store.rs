//! Persistent-store probe trait.
//!
//! The actual write path for validated records lives outside this crate;
//! the orchestrator only needs a reachability probe for health reporting.

use async_trait::async_trait;

use crate::error::Result;

/// Reachability probe against the durable record store.
#[async_trait]
pub trait StoreProbe: Send + Sync {
    /// Succeeds iff the store answers a trivial query.
    async fn ping(&self) -> Result<()>;
}
