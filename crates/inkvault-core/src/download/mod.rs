//! Download domain: jobs, chapter states, progress snapshots, errors, events.

pub mod errors;
pub mod events;
pub mod types;

pub use errors::DownloadError;
pub use events::DownloadEvent;
pub use types::{ChapterDownloadState, DownloadJob, ProgressSnapshot};
