//! Download error taxonomy.
//!
//! Every variant is serializable (no `std::io::Error` or client-library
//! payloads) so errors can cross event streams and wire boundaries intact.
//! Adapter crates map their internal errors into these at the port boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while processing a chapter download.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DownloadError {
    /// The job named a provider id that is not registered.
    #[error("unknown provider: {provider_id}")]
    UnknownProvider { provider_id: String },

    /// The provider's site answered with a non-success status or was
    /// unreachable. No retry is attempted.
    #[error("provider {provider_id} unavailable: {message}")]
    ProviderUnavailable { provider_id: String, message: String },

    /// The chapter page yielded zero images. Wire message is fixed because
    /// external consumers match on it.
    #[error("No images found in chapter")]
    NoPagesFound { chapter_url: String },

    #[error("failed to fetch image {url}: {message}")]
    ImageFetchFailed { url: String, message: String },

    /// The record store rejected or failed the chapter upsert.
    #[error("upload failed: {message}")]
    UploadFailed { message: String },

    /// The title's queue was cancelled while this chapter was in flight.
    #[error("download cancelled")]
    Cancelled,

    #[error("store error: {message}")]
    Store { message: String },

    #[error("{message}")]
    Other { message: String },
}

impl DownloadError {
    #[must_use]
    pub fn unknown_provider(provider_id: impl Into<String>) -> Self {
        Self::UnknownProvider {
            provider_id: provider_id.into(),
        }
    }

    #[must_use]
    pub fn provider_unavailable(provider_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider_id: provider_id.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn no_pages_found(chapter_url: impl Into<String>) -> Self {
        Self::NoPagesFound {
            chapter_url: chapter_url.into(),
        }
    }

    #[must_use]
    pub fn image_fetch_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImageFetchFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn upload_failed(message: impl Into<String>) -> Self {
        Self::UploadFailed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether this error is the cooperative cancellation signal rather
    /// than a real failure.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_pages_message_is_stable() {
        let err = DownloadError::no_pages_found("https://inkscan.io/comic/x/chapter-2");
        assert_eq!(err.to_string(), "No images found in chapter");
    }

    #[test]
    fn test_is_cancelled_predicate() {
        assert!(DownloadError::Cancelled.is_cancelled());
        assert!(!DownloadError::other("boom").is_cancelled());
    }

    #[test]
    fn test_error_serde_round_trip() {
        let err = DownloadError::image_fetch_failed("https://img.example/p1.jpg", "status 503");
        let json = serde_json::to_string(&err).unwrap();
        let back: DownloadError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_error_serializes_with_kind_tag() {
        let err = DownloadError::unknown_provider("nope");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "unknown_provider");
        assert_eq!(json["provider_id"], "nope");
    }
}
