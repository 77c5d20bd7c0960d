//! Directory service client and typed extraction layer.
//!
//! The client speaks parameterized GET against a fixed base URL and
//! only accepts JSON object or array bodies. The source layer adds
//! record unwrapping, pagination, and concurrent fan-out on top of the
//! orchestrator.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ExtractError, Result};
use crate::orchestrator::ExtractionOrchestrator;
use crate::traits::{Fetch, FetchTarget};

/// HTTP client for a remote directory API.
pub struct DirectoryClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl DirectoryClient {
    /// Create a client for the given API base URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        // Validate eagerly so a bad base URL fails at construction.
        let parsed = Url::parse(base_url.as_ref())?;
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("failed to create HTTP client"),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            user_agent: "DirectoryExtraction/1.0".to_string(),
        })
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Use a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn target_url(&self, target: &FetchTarget) -> String {
        format!("{}/{}", self.base_url, target.kind)
    }
}

#[async_trait]
impl Fetch for DirectoryClient {
    async fn fetch(&self, target: &FetchTarget) -> Result<Value> {
        let url = self.target_url(target);
        debug!(url = %url, "directory fetch starting");

        let response = self
            .client
            .get(&url)
            .query(&target.params)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "directory request failed");
                ExtractError::transient(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::transient(format!("HTTP {status}")));
        }

        let body: Value = response.json().await.map_err(ExtractError::transient)?;

        if body.is_object() || body.is_array() {
            Ok(body)
        } else {
            Err(ExtractError::Schema {
                reason: format!("expected JSON object or array, got {body}"),
            })
        }
    }

    async fn probe(&self) -> Result<()> {
        self.client
            .head(&self.base_url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(ExtractError::transient)?
            .error_for_status()
            .map_err(ExtractError::transient)?;
        Ok(())
    }
}

/// Unwrap a response body into its record list.
///
/// Arrays yield their elements. Objects yield the array under the field
/// named after the resource kind when present, otherwise the object
/// itself as a single record.
pub fn records_from_body(body: Value, kind: &str) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(kind) {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(map)],
        },
        other => vec![other],
    }
}

/// Typed extraction layer over the orchestrator.
pub struct DirectorySource<F: Fetch> {
    orchestrator: ExtractionOrchestrator<F>,
}

impl<F: Fetch> DirectorySource<F> {
    /// Wrap an orchestrator.
    pub fn new(orchestrator: ExtractionOrchestrator<F>) -> Self {
        Self { orchestrator }
    }

    /// The underlying orchestrator (metrics, health, cache access).
    pub fn orchestrator(&self) -> &ExtractionOrchestrator<F> {
        &self.orchestrator
    }

    /// Mutable orchestrator access (e.g. to register domain rules).
    pub fn orchestrator_mut(&mut self) -> &mut ExtractionOrchestrator<F> {
        &mut self.orchestrator
    }

    /// Extract the records for one target, cached under its derived key.
    pub async fn extract(&self, target: &FetchTarget) -> Result<Vec<Value>> {
        let key = target.cache_key();
        let body = self.orchestrator.robust_request(target, Some(&key)).await?;
        Ok(records_from_body(body, &target.kind))
    }

    /// Walk a paginated listing until a short or empty page.
    ///
    /// Pages are requested as `page_param=1, 2, ...`; a page with fewer
    /// than `page_size` records ends the walk. Each page is cached
    /// under its own key.
    pub async fn extract_paginated(
        &self,
        base: &FetchTarget,
        page_param: &str,
        page_size: usize,
    ) -> Result<Vec<Value>> {
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let target = base.clone().with_param(page_param, page);
            let records = self.extract(&target).await?;
            let count = records.len();
            all.extend(records);

            if count == 0 || count < page_size {
                break;
            }
            page += 1;
        }

        debug!(kind = %base.kind, pages = page, records = all.len(), "pagination complete");
        Ok(all)
    }

    /// Extract several targets concurrently under a concurrency gate.
    ///
    /// Results are index-aligned with the submitted targets; one
    /// target's failure does not cancel the others.
    pub async fn extract_many(
        &self,
        targets: Vec<FetchTarget>,
        max_concurrent: usize,
    ) -> Vec<Result<Vec<Value>>> {
        let tasks: Vec<_> = targets
            .into_iter()
            .map(|target| {
                let this = self;
                move || async move { this.extract(&target).await }
            })
            .collect();

        self.orchestrator
            .concurrent_extract(tasks, max_concurrent)
            .await
    }
}
