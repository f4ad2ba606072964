//! HTTP backend abstraction for site providers.
//!
//! This module provides a trait-based HTTP backend that allows for
//! dependency injection and easy testing. The production implementation
//! uses reqwest. There is deliberately no retry logic: a non-success
//! response fails the current chapter immediately and the queue moves on.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Default timeout for all provider requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw bytes plus the content type the server reported, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPayload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Trait for HTTP backends used by providers.
///
/// Providers hold `Arc<dyn HttpBackend>`, so all methods return dynamic
/// JSON; callers deserialize with `serde_json::from_value` where they need
/// typed responses.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Fetch a URL and parse the body as JSON.
    async fn get_json(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> ProviderResult<serde_json::Value>;

    /// Fetch a URL and return the body as text.
    async fn get_text(&self, url: &Url, headers: &[(String, String)]) -> ProviderResult<String>;

    /// Fetch a URL and return the raw bytes with the reported content type.
    async fn get_bytes(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> ProviderResult<FetchedPayload>;
}

/// Production HTTP backend using reqwest.
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Create a new reqwest backend.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to create HTTP client");

        Self { client }
    }

    fn build_request(&self, url: &Url, headers: &[(String, String)]) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url.as_str());
        for (name, value) in headers {
            request = request.header(name, value);
        }
        request
    }

    async fn fetch(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> ProviderResult<reqwest::Response> {
        let response = self.build_request(url, headers).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::unavailable(status.as_u16(), url.as_str()));
        }
        Ok(response)
    }
}

impl Default for ReqwestBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> ProviderResult<serde_json::Value> {
        let response = self.fetch(url, headers).await?;
        let data = response.json().await?;
        Ok(data)
    }

    async fn get_text(&self, url: &Url, headers: &[(String, String)]) -> ProviderResult<String> {
        let response = self.fetch(url, headers).await?;
        let body = response.text().await?;
        Ok(body)
    }

    async fn get_bytes(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> ProviderResult<FetchedPayload> {
        let response = self.fetch(url, headers).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(ToString::to_string);
        let bytes = response.bytes().await?.to_vec();
        Ok(FetchedPayload {
            bytes,
            content_type,
        })
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================
