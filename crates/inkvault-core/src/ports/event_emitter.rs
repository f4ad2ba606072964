//! Download event emitter port.
//!
//! Abstracts event delivery so the orchestrator can publish without
//! coupling to transport details (in-process channel, SSE, IPC).

use crate::download::DownloadEvent;

/// Port for emitting download events.
///
/// `emit` must not block: implementations buffer or forward asynchronously.
pub trait DownloadEventEmitterPort: Send + Sync {
    fn emit(&self, event: DownloadEvent);

    /// Clone this emitter into a boxed trait object.
    ///
    /// This enables cloning of `Arc<dyn DownloadEventEmitterPort>` without
    /// requiring the underlying type to implement Clone.
    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort>;
}

/// A no-op emitter for tests and contexts where progress is not observed.
#[derive(Debug, Clone, Default)]
pub struct NoopDownloadEmitter;

impl NoopDownloadEmitter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DownloadEventEmitterPort for NoopDownloadEmitter {
    fn emit(&self, _event: DownloadEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_noop_emitter() {
        let emitter = NoopDownloadEmitter::new();

        // Should not panic
        emitter.emit(DownloadEvent::chapter_uploading("t1", 1));
    }

    #[test]
    fn test_noop_emitter_clone_box() {
        let emitter = NoopDownloadEmitter::new();
        let _boxed: Box<dyn DownloadEventEmitterPort> = emitter.clone_box();
    }

    #[test]
    fn test_arc_emitter() {
        let emitter: Arc<dyn DownloadEventEmitterPort> = Arc::new(NoopDownloadEmitter::new());
        emitter.emit(DownloadEvent::chapter_uploading("t1", 1));
    }
}
