//! Core domain types and port definitions for inkvault.
//!
//! This crate is dependency-light on purpose: it holds the value objects,
//! download state machine types, events, the error taxonomy, and the port
//! traits every adapter implements. No HTTP, no storage, no runtime wiring.

#![deny(unused_crate_dependencies)]

pub mod download;
pub mod ports;
pub mod records;
pub mod series;

// Re-export commonly used types for convenience
pub use download::{
    ChapterDownloadState, DownloadError, DownloadEvent, DownloadJob, ProgressSnapshot,
};
pub use ports::{
    DownloadEventEmitterPort, FetchError, FetchedImage, ImageFetcherPort, ImagePayload,
    ImagePipelineError, ImagePipelinePort, NewChapterRecord, NoopDownloadEmitter,
    NoopImagePipeline, OptimizedImage, RecordStorePort, StoreError,
};
pub use records::{ChapterListCache, ChapterRecord, StoredImage, TitleSummary};
pub use series::{Chapter, Page, SeriesDetails, SeriesIdentifier};

// Silence the unused dev-dependency warning
#[cfg(test)]
use tokio_test as _;
