//! Download events published to the progress channel.
//!
//! Events are a tagged union so wire consumers can dispatch on `type`.
//! `event_name()` gives the stable channel name used by subscription
//! filters; snapshot events carry the full queue projection while the
//! chapter-scoped events carry just enough for single-chapter watchers.

use serde::{Deserialize, Serialize};

use super::types::ProgressSnapshot;

/// Events emitted by the download orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// Full queue projection for a title. Published on every observable
    /// mutation of the queue.
    Snapshot { snapshot: ProgressSnapshot },

    /// The page list for a chapter was resolved.
    ChapterPages {
        title_id: String,
        chapter_number: u32,
        total: u32,
    },

    /// One more page image finished downloading.
    ChapterProgress {
        title_id: String,
        chapter_number: u32,
        downloaded: u32,
        total: u32,
    },

    /// All images fetched; the chapter is being persisted.
    ChapterUploading {
        title_id: String,
        chapter_number: u32,
    },

    /// The chapter was persisted successfully.
    ChapterComplete {
        title_id: String,
        chapter_number: u32,
        record_id: String,
        size_bytes: u64,
    },

    /// The chapter failed; the queue moves on to the next job.
    ChapterError {
        title_id: String,
        chapter_number: u32,
        message: String,
    },
}

impl DownloadEvent {
    #[must_use]
    pub const fn snapshot(snapshot: ProgressSnapshot) -> Self {
        Self::Snapshot { snapshot }
    }

    #[must_use]
    pub fn chapter_pages(title_id: impl Into<String>, chapter_number: u32, total: u32) -> Self {
        Self::ChapterPages {
            title_id: title_id.into(),
            chapter_number,
            total,
        }
    }

    #[must_use]
    pub fn chapter_progress(
        title_id: impl Into<String>,
        chapter_number: u32,
        downloaded: u32,
        total: u32,
    ) -> Self {
        Self::ChapterProgress {
            title_id: title_id.into(),
            chapter_number,
            downloaded,
            total,
        }
    }

    #[must_use]
    pub fn chapter_uploading(title_id: impl Into<String>, chapter_number: u32) -> Self {
        Self::ChapterUploading {
            title_id: title_id.into(),
            chapter_number,
        }
    }

    #[must_use]
    pub fn chapter_complete(
        title_id: impl Into<String>,
        chapter_number: u32,
        record_id: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self::ChapterComplete {
            title_id: title_id.into(),
            chapter_number,
            record_id: record_id.into(),
            size_bytes,
        }
    }

    #[must_use]
    pub fn chapter_error(
        title_id: impl Into<String>,
        chapter_number: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::ChapterError {
            title_id: title_id.into(),
            chapter_number,
            message: message.into(),
        }
    }

    /// Stable channel name for subscription filtering.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } => "download:snapshot",
            Self::ChapterPages { .. } => "chapter:pages",
            Self::ChapterProgress { .. } => "chapter:progress",
            Self::ChapterUploading { .. } => "chapter:uploading",
            Self::ChapterComplete { .. } => "chapter:complete",
            Self::ChapterError { .. } => "chapter:error",
        }
    }

    /// The title this event belongs to.
    #[must_use]
    pub fn title_id(&self) -> &str {
        match self {
            Self::Snapshot { snapshot } => &snapshot.title_id,
            Self::ChapterPages { title_id, .. }
            | Self::ChapterProgress { title_id, .. }
            | Self::ChapterUploading { title_id, .. }
            | Self::ChapterComplete { title_id, .. }
            | Self::ChapterError { title_id, .. } => title_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let snapshot = ProgressSnapshot {
            title_id: "t1".to_string(),
            title_name: "Example".to_string(),
            current_chapter: None,
            queued_chapter_numbers: vec![],
            completed_chapter_numbers: vec![],
            is_processing: false,
        };

        assert_eq!(
            DownloadEvent::snapshot(snapshot).event_name(),
            "download:snapshot"
        );
        assert_eq!(
            DownloadEvent::chapter_pages("t1", 1, 9).event_name(),
            "chapter:pages"
        );
        assert_eq!(
            DownloadEvent::chapter_progress("t1", 1, 3, 9).event_name(),
            "chapter:progress"
        );
        assert_eq!(
            DownloadEvent::chapter_uploading("t1", 1).event_name(),
            "chapter:uploading"
        );
        assert_eq!(
            DownloadEvent::chapter_complete("t1", 1, "rec-1", 4096).event_name(),
            "chapter:complete"
        );
        assert_eq!(
            DownloadEvent::chapter_error("t1", 1, "boom").event_name(),
            "chapter:error"
        );
    }

    #[test]
    fn test_title_id_accessor() {
        let event = DownloadEvent::chapter_progress("t42", 7, 1, 9);
        assert_eq!(event.title_id(), "t42");
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = DownloadEvent::chapter_complete("t1", 2, "rec-9", 1234);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "chapter_complete");
        assert_eq!(json["chapter_number"], 2);
        assert_eq!(json["record_id"], "rec-9");
        assert_eq!(json["size_bytes"], 1234);
    }
}
