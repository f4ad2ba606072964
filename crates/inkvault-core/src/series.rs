//! Series-level value objects produced by providers.
//!
//! Everything here is an immutable projection of what a provider scraped or
//! parsed. None of these types know how to fetch anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a series on a specific provider, recovered from a catalog URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesIdentifier {
    /// Stable identifier of the provider that recognized the URL.
    pub provider_id: String,
    /// Opaque provider-defined identifier. May embed sub-parameters using a
    /// separator convention private to the provider; callers never inspect it.
    pub series_id: String,
    /// The URL the identifier was parsed from, kept for display and re-entry.
    pub source_url: String,
}

impl SeriesIdentifier {
    #[must_use]
    pub fn new(
        provider_id: impl Into<String>,
        series_id: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            series_id: series_id.into(),
            source_url: source_url.into(),
        }
    }
}

/// A chapter as listed by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Provider-local identifier, distinct from `number`.
    pub id: String,
    /// Provider-assigned ordering key. Positive, not necessarily contiguous:
    /// sites skip numbers for specials and removed entries.
    pub number: u32,
    pub title: String,
    /// Reader URL for this chapter, consumed by `fetch_chapter_pages`.
    pub url: String,
    pub date_published: Option<DateTime<Utc>>,
    /// Some providers mark paywalled chapters; `None` when the site does not
    /// expose the flag.
    pub is_locked: Option<bool>,
}

/// A single page image reference inside a chapter.
///
/// Pages are ephemeral: fetched, consumed, never persisted. When `headers`
/// is set, those pairs override the provider-level image headers during the
/// merge performed by the download side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub headers: Option<Vec<(String, String)>>,
}

impl Page {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: None,
        }
    }

    #[must_use]
    pub fn with_headers(url: impl Into<String>, headers: Vec<(String, String)>) -> Self {
        Self {
            url: url.into(),
            headers: Some(headers),
        }
    }
}

/// Optional series metadata a provider may be able to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesDetails {
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    /// Publication status as the site reports it ("ongoing", "completed", ...).
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_identifier_new() {
        let id = SeriesIdentifier::new("paneltoon", "9913", "https://paneltoon.net/series/9913");
        assert_eq!(id.provider_id, "paneltoon");
        assert_eq!(id.series_id, "9913");
    }

    #[test]
    fn test_page_defaults_to_no_header_overrides() {
        let page = Page::new("https://img.example.net/p/1.jpg");
        assert!(page.headers.is_none());
    }

    #[test]
    fn test_page_with_headers_keeps_pair_order() {
        let page = Page::with_headers(
            "https://img.example.net/p/1.jpg",
            vec![
                ("Referer".to_string(), "https://example.net/".to_string()),
                ("X-Token".to_string(), "abc".to_string()),
            ],
        );
        let headers = page.headers.unwrap();
        assert_eq!(headers[0].0, "Referer");
        assert_eq!(headers[1].0, "X-Token");
    }

    #[test]
    fn test_chapter_serde_round_trip() {
        let chapter = Chapter {
            id: "ep-204".to_string(),
            number: 12,
            title: "Episode 12".to_string(),
            url: "https://paneltoon.net/viewer/9913/ep-204".to_string(),
            date_published: Some("2024-03-01T00:00:00Z".parse().unwrap()),
            is_locked: Some(false),
        };

        let json = serde_json::to_string(&chapter).unwrap();
        let back: Chapter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chapter);
    }
}
