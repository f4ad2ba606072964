//! Record shapes exchanged with the external record store.
//!
//! The store itself (file backend, database, remote service) lives behind
//! [`crate::ports::RecordStorePort`]; these are the DTOs that cross it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::series::Chapter;

/// Aggregate bookkeeping row for one archived title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleSummary {
    pub id: String,
    pub name: String,
    pub chapters_downloaded: u32,
    /// Chapter count as last reported by the provider, when known.
    pub chapters_total: u32,
    pub size_on_disk: u64,
}

/// One stored image file belonging to a chapter record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub file_id: String,
    pub content_type: String,
    pub size_bytes: u64,
}

/// A persisted chapter. Uniqueness is on `(title_id, chapter_number)`;
/// re-downloading a chapter updates this record in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub id: String,
    pub title_id: String,
    pub chapter_number: u32,
    pub episode_title: String,
    pub images: Vec<StoredImage>,
    pub size_bytes: u64,
    pub downloaded_at: DateTime<Utc>,
}

/// Cached result of a provider chapter listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterListCache {
    pub provider_id: String,
    pub series_id: String,
    pub chapters: Vec<Chapter>,
    pub cached_at: DateTime<Utc>,
}

impl ChapterListCache {
    /// Whether the cached listing is younger than `max_age` as of `now`.
    #[must_use]
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now - self.cached_at < max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_at(cached_at: &str) -> ChapterListCache {
        ChapterListCache {
            provider_id: "paneltoon".to_string(),
            series_id: "9913".to_string(),
            chapters: vec![],
            cached_at: cached_at.parse().unwrap(),
        }
    }

    #[test]
    fn test_cache_fresh_within_max_age() {
        let cache = cache_at("2024-03-01T12:00:00Z");
        let now = "2024-03-01T12:30:00Z".parse().unwrap();
        assert!(cache.is_fresh(Duration::hours(1), now));
    }

    #[test]
    fn test_cache_stale_past_max_age() {
        let cache = cache_at("2024-03-01T12:00:00Z");
        let now = "2024-03-01T14:00:00Z".parse().unwrap();
        assert!(!cache.is_fresh(Duration::hours(1), now));
    }

    #[test]
    fn test_chapter_record_serde_round_trip() {
        let record = ChapterRecord {
            id: "rec-1".to_string(),
            title_id: "t1".to_string(),
            chapter_number: 3,
            episode_title: "Episode 3".to_string(),
            images: vec![StoredImage {
                file_id: "f1".to_string(),
                content_type: "image/jpeg".to_string(),
                size_bytes: 2048,
            }],
            size_bytes: 2048,
            downloaded_at: "2024-03-01T12:00:00Z".parse().unwrap(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: ChapterRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
