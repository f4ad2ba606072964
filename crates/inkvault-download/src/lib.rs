//! Download orchestration for inkvault.
//!
//! The orchestrator runs one sequential chapter queue per title and fetches
//! page images in small concurrent batches. Progress flows out as events on
//! the [`progress::ProgressChannel`]; all side effects go through the port
//! traits defined in `inkvault-core`, so everything here is testable with
//! in-memory fakes.

#![deny(unused_crate_dependencies)]

pub mod listing;
pub mod orchestrator;
pub mod progress;

pub use listing::ChapterListService;
pub use orchestrator::queue::TitleQueue;
pub use orchestrator::{DownloadOrchestrator, OrchestratorDeps, PAGE_BATCH_SIZE};
pub use progress::{EventStream, ProgressChannel};

// Silence the unused dev-dependency warning
#[cfg(test)]
use tokio_test as _;
