//! Provider-internal error types.
//!
//! These stay inside the providers crate; the download side maps them into
//! the serializable core `DownloadError` taxonomy at the port boundary.

use thiserror::Error;

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Non-success HTTP status. No retry is attempted; the chapter fails
    /// and the queue moves on.
    #[error("request to {url} failed with status {status}")]
    Unavailable { status: u16, url: String },

    #[error("no pages found at {chapter_url}")]
    NoPagesFound { chapter_url: String },

    /// The URL does not belong to this provider's hosts. Guards against
    /// jobs routed to the wrong provider.
    #[error("{url} does not belong to provider {provider_id}")]
    ForeignUrl { url: String, provider_id: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("decrypt failed: {message}")]
    Decrypt { message: String },

    #[error("{operation} is not supported by provider {provider_id}")]
    Unsupported {
        operation: String,
        provider_id: String,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl ProviderError {
    #[must_use]
    pub fn unavailable(status: u16, url: impl Into<String>) -> Self {
        Self::Unavailable {
            status,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn no_pages_found(chapter_url: impl Into<String>) -> Self {
        Self::NoPagesFound {
            chapter_url: chapter_url.into(),
        }
    }

    #[must_use]
    pub fn foreign_url(url: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self::ForeignUrl {
            url: url.into(),
            provider_id: provider_id.into(),
        }
    }

    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decrypt(message: impl Into<String>) -> Self {
        Self::Decrypt {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unsupported(operation: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
            provider_id: provider_id.into(),
        }
    }
}
