//! Record store port.
//!
//! The store owns persistence of chapter records, image files, title
//! summaries, and chapter-list caches. It lives outside this workspace;
//! downloads talk to it exclusively through this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::{ChapterListCache, ChapterRecord, TitleSummary};

/// Errors surfaced by a record store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreError {
    /// No summary row exists for the title. The orchestrator tolerates this
    /// during aggregate recomputation; other callers usually do not.
    #[error("title not found: {title_id}")]
    TitleNotFound { title_id: String },

    #[error("store error: {message}")]
    Backend { message: String },
}

impl StoreError {
    #[must_use]
    pub fn title_not_found(title_id: impl Into<String>) -> Self {
        Self::TitleNotFound {
            title_id: title_id.into(),
        }
    }

    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_title_not_found(&self) -> bool {
        matches!(self, Self::TitleNotFound { .. })
    }
}

/// Raw image bytes ready to persist, produced by the image pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Payload for a chapter upsert. The store assigns record and file ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChapterRecord {
    pub title_id: String,
    pub chapter_number: u32,
    pub episode_title: String,
    /// In page order.
    pub images: Vec<ImagePayload>,
}

/// Port to the external record store.
///
/// `upsert_chapter` is the idempotence mechanism: when a record for
/// `(title_id, chapter_number)` already exists it is updated in place and
/// keeps its id, so repeated downloads of the same chapter never create
/// duplicates.
#[async_trait]
pub trait RecordStorePort: Send + Sync {
    async fn find_chapter(
        &self,
        title_id: &str,
        chapter_number: u32,
    ) -> Result<Option<ChapterRecord>, StoreError>;

    async fn upsert_chapter(&self, record: NewChapterRecord) -> Result<ChapterRecord, StoreError>;

    async fn list_chapters(&self, title_id: &str) -> Result<Vec<ChapterRecord>, StoreError>;

    async fn title_summary(&self, title_id: &str) -> Result<TitleSummary, StoreError>;

    async fn update_title_summary(&self, summary: TitleSummary) -> Result<(), StoreError>;

    async fn chapter_list_cache(
        &self,
        provider_id: &str,
        series_id: &str,
    ) -> Result<Option<ChapterListCache>, StoreError>;

    async fn put_chapter_list_cache(&self, cache: ChapterListCache) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_not_found_predicate() {
        assert!(StoreError::title_not_found("t1").is_title_not_found());
        assert!(!StoreError::backend("disk full").is_title_not_found());
    }

    #[test]
    fn test_store_error_serde_round_trip() {
        let err = StoreError::title_not_found("t1");
        let json = serde_json::to_string(&err).unwrap();
        let back: StoreError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
