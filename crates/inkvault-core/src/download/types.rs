//! Download job and progress projection types.

use serde::{Deserialize, Serialize};

/// One chapter to download. Immutable; consumed exactly once by the
/// processing loop of its title queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadJob {
    pub chapter_number: u32,
    pub chapter_url: String,
    pub episode_title: String,
    /// Which registered provider handles this chapter's URL.
    pub provider_id: String,
}

impl DownloadJob {
    #[must_use]
    pub fn new(
        chapter_number: u32,
        chapter_url: impl Into<String>,
        episode_title: impl Into<String>,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            chapter_number,
            chapter_url: chapter_url.into(),
            episode_title: episode_title.into(),
            provider_id: provider_id.into(),
        }
    }
}

/// State of the chapter currently being processed.
///
/// Transitions are strictly forward: `FetchingPages` → `Downloading` →
/// `Uploading` → `Complete`, with `Error` reachable from any of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChapterDownloadState {
    FetchingPages,
    Downloading {
        images_downloaded: u32,
        images_total: u32,
    },
    Uploading,
    Complete {
        images_downloaded: u32,
        images_total: u32,
    },
    Error {
        message: String,
    },
}

impl ChapterDownloadState {
    /// Whether this state ends the chapter's lifecycle.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

/// Immutable point-in-time projection of one title's queue.
///
/// Snapshots are values: once published, later queue mutations never alter
/// an already-emitted snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub title_id: String,
    pub title_name: String,
    pub current_chapter: Option<ChapterDownloadState>,
    pub queued_chapter_numbers: Vec<u32>,
    /// Sorted ascending; grows monotonically for the lifetime of the queue.
    pub completed_chapter_numbers: Vec<u32>,
    pub is_processing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!ChapterDownloadState::FetchingPages.is_terminal());
        assert!(
            !ChapterDownloadState::Downloading {
                images_downloaded: 1,
                images_total: 9,
            }
            .is_terminal()
        );
        assert!(!ChapterDownloadState::Uploading.is_terminal());
        assert!(
            ChapterDownloadState::Complete {
                images_downloaded: 9,
                images_total: 9,
            }
            .is_terminal()
        );
        assert!(
            ChapterDownloadState::Error {
                message: "boom".to_string(),
            }
            .is_terminal()
        );
    }

    #[test]
    fn test_state_serializes_with_type_tag() {
        let state = ChapterDownloadState::Downloading {
            images_downloaded: 2,
            images_total: 9,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["type"], "downloading");
        assert_eq!(json["images_downloaded"], 2);
        assert_eq!(json["images_total"], 9);
    }

    #[test]
    fn test_snapshot_serde_round_trip() {
        let snapshot = ProgressSnapshot {
            title_id: "t1".to_string(),
            title_name: "Example Title".to_string(),
            current_chapter: Some(ChapterDownloadState::FetchingPages),
            queued_chapter_numbers: vec![2, 3],
            completed_chapter_numbers: vec![1],
            is_processing: true,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ProgressSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
