//! Image fetcher port.
//!
//! One page image fetch, with the already-merged request headers. Header
//! merging (provider-level defaults under per-page overrides) is the
//! caller's job; the fetcher sends exactly what it is given.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fetched page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    #[error("fetch of {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("fetch of {url} failed: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    #[must_use]
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ImageFetcherPort: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<FetchedImage, FetchError>;
}
