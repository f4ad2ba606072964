//! Ports for external collaborators.
//!
//! Each port is an async trait implemented by an adapter crate (or a test
//! fake). The download orchestrator depends only on these, never on concrete
//! HTTP clients or storage backends.

pub mod event_emitter;
pub mod image_fetcher;
pub mod image_pipeline;
pub mod record_store;

pub use event_emitter::{DownloadEventEmitterPort, NoopDownloadEmitter};
pub use image_fetcher::{FetchError, FetchedImage, ImageFetcherPort};
pub use image_pipeline::{ImagePipelineError, ImagePipelinePort, NoopImagePipeline, OptimizedImage};
pub use record_store::{ImagePayload, NewChapterRecord, RecordStorePort, StoreError};
