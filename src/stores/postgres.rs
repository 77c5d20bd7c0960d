//! Postgres reachability probe.
//!
//! The record upsert path lives in the consuming application; this
//! crate only needs to know whether the store answers at all.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{ExtractError, Result};
use crate::traits::store::StoreProbe;

/// Store probe backed by a Postgres connection pool.
pub struct PgStoreProbe {
    pool: PgPool,
}

impl PgStoreProbe {
    /// Probe against an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreProbe for PgStoreProbe {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ExtractError::Store(Box::new(e)))?;
        Ok(())
    }
}
