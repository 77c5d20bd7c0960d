//! HTTP-backed remote cache client.
//!
//! Talks to a network key-value service with get / set-with-expiry
//! semantics. This is the shared tier of the layered cache; callers
//! treat every failure here as a soft degradation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::traits::cache::RemoteCache;

/// Remote KV cache speaking plain HTTP.
///
/// Keys map to `{base_url}/{key}`; writes carry the TTL as a query
/// parameter and the serialized value as the body.
pub struct HttpKvCache {
    client: reqwest::Client,
    base_url: String,
}

impl HttpKvCache {
    /// Create a client for the given cache service base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("failed to create HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Use a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn key_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl RemoteCache for HttpKvCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.key_url(key))
            .send()
            .await
            .map_err(|e| ExtractError::Cache(Box::new(e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| ExtractError::Cache(Box::new(e)))?;
                debug!(key, bytes = body.len(), "remote cache hit");
                Ok(Some(body))
            }
            status => Err(ExtractError::Cache(
                format!("unexpected status {status}").into(),
            )),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let response = self
            .client
            .put(self.key_url(key))
            .query(&[("ttl", ttl.as_secs())])
            .body(value.to_string())
            .send()
            .await
            .map_err(|e| ExtractError::Cache(Box::new(e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ExtractError::Cache(
                format!("unexpected status {}", response.status()).into(),
            ))
        }
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .head(&self.base_url)
            .send()
            .await
            .map_err(|e| ExtractError::Cache(Box::new(e)))?
            .error_for_status()
            .map_err(|e| ExtractError::Cache(Box::new(e)))?;
        Ok(())
    }
}
