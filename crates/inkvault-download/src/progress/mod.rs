//! Progress channel: ordered, lossless delivery of download events.
//!
//! The channel is a push-to-pull bridge. Publishing never blocks and never
//! drops: each subscriber gets its own unbounded buffer, so a consumer that
//! stops pulling only grows its own buffer. A stream ends when one of its
//! terminal events is delivered, when its cancellation token fires, or when
//! the consumer drops it (the publisher prunes dead subscribers on the next
//! emit).

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use inkvault_core::{DownloadEvent, DownloadEventEmitterPort};

struct Subscriber {
    tx: mpsc::UnboundedSender<DownloadEvent>,
    /// `None` subscribes to everything.
    events: Option<HashSet<String>>,
    terminal: HashSet<String>,
}

impl Subscriber {
    fn wants(&self, name: &str) -> bool {
        self.terminal.contains(name)
            || self
                .events
                .as_ref()
                .map_or(true, |set| set.contains(name))
    }
}

/// Fan-out event channel implementing the emitter port.
#[derive(Clone, Default)]
pub struct ProgressChannel {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl ProgressChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the named events; the stream ends after delivering any
    /// of `terminal_events`, or when `cancel` fires. Empty `events`
    /// subscribes to everything.
    #[must_use]
    pub fn subscribe(
        &self,
        events: &[&str],
        terminal_events: &[&str],
        cancel: CancellationToken,
    ) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriber = Subscriber {
            tx,
            events: if events.is_empty() {
                None
            } else {
                Some(events.iter().map(ToString::to_string).collect())
            },
            terminal: terminal_events.iter().map(ToString::to_string).collect(),
        };
        self.lock_subscribers().push(subscriber);
        EventStream {
            rx,
            cancelled: Box::pin(cancel.cancelled_owned()),
        }
    }

    /// Subscribe to every event with no terminal condition.
    #[must_use]
    pub fn subscribe_all(&self, cancel: CancellationToken) -> EventStream {
        self.subscribe(&[], &[], cancel)
    }

    /// Subscribe to queue snapshots only.
    #[must_use]
    pub fn subscribe_snapshots(&self, cancel: CancellationToken) -> EventStream {
        self.subscribe(&["download:snapshot"], &[], cancel)
    }

    /// Deliver an event to every interested subscriber, pruning the ones
    /// whose consumers are gone and closing the ones that just received a
    /// terminal event.
    pub fn publish(&self, event: &DownloadEvent) {
        let name = event.event_name();
        let mut subscribers = self.lock_subscribers();
        subscribers.retain(|subscriber| {
            if !subscriber.wants(name) {
                return true;
            }
            if subscriber.tx.send(event.clone()).is_err() {
                // Consumer dropped its stream
                return false;
            }
            // Dropping the sender closes the stream after it drains, so the
            // terminal event itself is still delivered.
            !subscriber.terminal.contains(name)
        });
    }

    /// Number of live subscribers (dead ones linger until the next publish).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DownloadEventEmitterPort for ProgressChannel {
    fn emit(&self, event: DownloadEvent) {
        self.publish(&event);
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}

/// Pull side of a subscription.
///
/// Yields buffered events in publish order; ends on terminal event,
/// cancellation, or publisher shutdown.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<DownloadEvent>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl Stream for EventStream {
    type Item = DownloadEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancelled.as_mut().poll(cx).is_ready() {
            self.rx.close();
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}
