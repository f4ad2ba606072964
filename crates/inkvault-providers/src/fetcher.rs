//! Page image fetcher.
//!
//! Implements the core `ImageFetcherPort` over the same HTTP backend the
//! providers use, so tests can script image bytes alongside API responses.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use inkvault_core::{FetchError, FetchedImage, ImageFetcherPort};

use crate::error::ProviderError;
use crate::http::{HttpBackend, ReqwestBackend};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub struct ReqwestImageFetcher {
    http: Arc<dyn HttpBackend>,
}

impl ReqwestImageFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: Arc::new(ReqwestBackend::new()),
        }
    }

    #[must_use]
    pub fn with_backend(http: Arc<dyn HttpBackend>) -> Self {
        Self { http }
    }
}

impl Default for ReqwestImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcherPort for ReqwestImageFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<FetchedImage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::network(url, e.to_string()))?;

        match self.http.get_bytes(&parsed, headers).await {
            Ok(payload) => Ok(FetchedImage {
                bytes: payload.bytes,
                content_type: payload
                    .content_type
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            }),
            Err(ProviderError::Unavailable { status, url: u }) => Err(FetchError::status(u, status)),
            Err(e) => Err(FetchError::network(url, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeBackend;

    #[tokio::test]
    async fn test_fetch_returns_bytes_and_content_type() {
        let backend = FakeBackend::new().with_bytes(
            "p1.jpg",
            vec![0xff, 0xd8, 0xff],
            Some("image/jpeg"),
        );
        let fetcher = ReqwestImageFetcher::with_backend(Arc::new(backend));

        let image = fetcher
            .fetch("https://cdn.inkscan.io/long-night/1/p1.jpg", &[])
            .await
            .unwrap();
        assert_eq!(image.bytes, vec![0xff, 0xd8, 0xff]);
        assert_eq!(image.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_missing_content_type_defaults() {
        let backend = FakeBackend::new().with_bytes("p1.jpg", vec![1], None);
        let fetcher = ReqwestImageFetcher::with_backend(Arc::new(backend));

        let image = fetcher
            .fetch("https://cdn.inkscan.io/p1.jpg", &[])
            .await
            .unwrap();
        assert_eq!(image.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_status_failure_maps_to_fetch_error() {
        let backend = FakeBackend::new().with_status("p1.jpg", 403);
        let fetcher = ReqwestImageFetcher::with_backend(Arc::new(backend));

        let err = fetcher
            .fetch("https://cdn.inkscan.io/p1.jpg", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_invalid_url_is_network_error() {
        let fetcher = ReqwestImageFetcher::with_backend(Arc::new(FakeBackend::new()));
        let err = fetcher.fetch("not a url", &[]).await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }
}
