//! Download orchestrator.
//!
//! One FIFO queue and one processing task per title. Chapters within a
//! title are strictly sequential; page images within a chapter are fetched
//! in fixed concurrent batches. Every failure is contained to its chapter:
//! the job is marked consumed and the queue moves on. Cancellation is
//! cooperative per title and silences all further snapshots for it.

pub mod queue;

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use inkvault_core::{
    ChapterDownloadState, DownloadError, DownloadEvent, DownloadEventEmitterPort, DownloadJob,
    FetchedImage, ImageFetcherPort, ImagePayload, ImagePipelinePort, NewChapterRecord,
    ProgressSnapshot, RecordStorePort, StoreError,
};
use inkvault_providers::{ProviderError, ProviderRegistry};

use self::queue::TitleQueue;

/// Number of page images fetched concurrently per batch.
pub const PAGE_BATCH_SIZE: usize = 3;

/// External collaborators the orchestrator needs.
pub struct OrchestratorDeps {
    pub registry: Arc<ProviderRegistry>,
    pub store: Arc<dyn RecordStorePort>,
    pub fetcher: Arc<dyn ImageFetcherPort>,
    pub pipeline: Arc<dyn ImagePipelinePort>,
    pub emitter: Arc<dyn DownloadEventEmitterPort>,
}

struct QueueHandle {
    queue: Arc<Mutex<TitleQueue>>,
    cancel: CancellationToken,
}

pub struct DownloadOrchestrator {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn RecordStorePort>,
    fetcher: Arc<dyn ImageFetcherPort>,
    pipeline: Arc<dyn ImagePipelinePort>,
    emitter: Arc<dyn DownloadEventEmitterPort>,
    queues: Mutex<HashMap<String, QueueHandle>>,
}

impl DownloadOrchestrator {
    #[must_use]
    pub fn new(deps: OrchestratorDeps) -> Arc<Self> {
        Arc::new(Self {
            registry: deps.registry,
            store: deps.store,
            fetcher: deps.fetcher,
            pipeline: deps.pipeline,
            emitter: deps.emitter,
            queues: Mutex::new(HashMap::new()),
        })
    }

    /// Enqueue chapters for a title. Creates the queue and its processing
    /// task on first use; otherwise appends (deduplicated) to the live
    /// queue. Returns the post-append snapshot immediately.
    pub async fn enqueue(
        self: &Arc<Self>,
        title_id: &str,
        title_name: &str,
        jobs: Vec<DownloadJob>,
    ) -> ProgressSnapshot {
        let mut queues = self.queues.lock().await;

        if let Some(handle) = queues.get(title_id) {
            let mut queue = handle.queue.lock().await;
            let accepted = queue.enqueue_dedup(jobs);
            let snapshot = queue.snapshot();
            self.publish_queue(&queue, &handle.cancel);
            drop(queue);
            debug!(
                target: "inkvault.download",
                title_id = %title_id,
                accepted,
                "appended jobs to live queue"
            );
            return snapshot;
        }

        let mut queue = TitleQueue::new(title_id, title_name);
        let accepted = queue.enqueue_dedup(jobs);
        let snapshot = queue.snapshot();
        let cancel = CancellationToken::new();
        self.publish_queue(&queue, &cancel);

        let queue = Arc::new(Mutex::new(queue));
        queues.insert(
            title_id.to_string(),
            QueueHandle {
                queue: Arc::clone(&queue),
                cancel: cancel.clone(),
            },
        );
        drop(queues);

        info!(
            target: "inkvault.download",
            title_id = %title_id,
            accepted,
            "starting download queue"
        );

        let this = Arc::clone(self);
        let id = title_id.to_string();
        tokio::spawn(async move {
            this.run_queue(id, queue, cancel).await;
        });

        snapshot
    }

    /// Cancel a title's queue. Pending jobs are dropped, the in-flight
    /// batch is allowed to finish but all its output is suppressed, and one
    /// final `is_processing: false` snapshot is published. Returns whether
    /// a queue existed.
    pub async fn cancel(&self, title_id: &str) -> bool {
        let handle = self.queues.lock().await.remove(title_id);
        let Some(handle) = handle else {
            return false;
        };

        // Token first: from here on the processing loop publishes nothing.
        handle.cancel.cancel();

        let mut queue = handle.queue.lock().await;
        queue.clear_for_cancel();
        let snapshot = queue.snapshot();
        // Emitted directly: the gate would suppress it, but consumers still
        // get the final empty snapshot. Ordering is safe because the loop's
        // publishes are serialized under the same queue lock.
        self.emitter.emit(DownloadEvent::snapshot(snapshot));
        drop(queue);

        info!(target: "inkvault.download", title_id = %title_id, "download queue cancelled");
        true
    }

    /// Current snapshot of a live queue, `None` once drained or cancelled.
    pub async fn status(&self, title_id: &str) -> Option<ProgressSnapshot> {
        let queues = self.queues.lock().await;
        let handle = queues.get(title_id)?;
        let queue = handle.queue.lock().await;
        Some(queue.snapshot())
    }

    /// Snapshots of every live queue.
    pub async fn all_active(&self) -> Vec<ProgressSnapshot> {
        let queues = self.queues.lock().await;
        let mut snapshots = Vec::with_capacity(queues.len());
        for handle in queues.values() {
            snapshots.push(handle.queue.lock().await.snapshot());
        }
        snapshots
    }

    async fn run_queue(
        self: Arc<Self>,
        title_id: String,
        queue: Arc<Mutex<TitleQueue>>,
        cancel: CancellationToken,
    ) {
        loop {
            if cancel.is_cancelled() {
                // cancel() already cleaned up and emitted the final snapshot
                return;
            }

            let popped = {
                let mut q = queue.lock().await;
                let job = q.pop_next();
                if job.is_some() {
                    self.publish_queue(&q, &cancel);
                }
                job
            };

            let Some(job) = popped else {
                // The idle re-check and handle removal happen under the map
                // lock: a concurrent enqueue either appends before the check
                // (the loop keeps going) or finds the handle gone and starts
                // a fresh queue. Accepted jobs are never dropped.
                let mut queues = self.queues.lock().await;
                let mut q = queue.lock().await;
                if !q.is_idle() {
                    continue;
                }
                q.mark_drained();
                self.publish_queue(&q, &cancel);
                drop(q);
                if let Some(handle) = queues.get(&title_id) {
                    if Arc::ptr_eq(&handle.queue, &queue) {
                        queues.remove(&title_id);
                    }
                }
                drop(queues);
                info!(target: "inkvault.download", title_id = %title_id, "download queue drained");
                return;
            };

            info!(
                target: "inkvault.download",
                title_id = %title_id,
                chapter = job.chapter_number,
                "processing chapter"
            );

            match self
                .process_chapter(&title_id, &job, &queue, &cancel)
                .await
            {
                Ok(outcome) => {
                    let mut q = queue.lock().await;
                    q.set_state(ChapterDownloadState::Complete {
                        images_downloaded: outcome.images_total,
                        images_total: outcome.images_total,
                    });
                    self.publish_queue(&q, &cancel);
                    self.publish_event(
                        DownloadEvent::chapter_complete(
                            &title_id,
                            job.chapter_number,
                            outcome.record_id,
                            outcome.size_bytes,
                        ),
                        &cancel,
                    );
                    q.finish_current();
                }
                Err(err) if err.is_cancelled() => {
                    debug!(
                        target: "inkvault.download",
                        title_id = %title_id,
                        chapter = job.chapter_number,
                        "chapter abandoned by cancellation"
                    );
                    return;
                }
                Err(err) => {
                    warn!(
                        target: "inkvault.download",
                        title_id = %title_id,
                        chapter = job.chapter_number,
                        error = %err,
                        "chapter failed"
                    );
                    let mut q = queue.lock().await;
                    q.set_state(ChapterDownloadState::Error {
                        message: err.to_string(),
                    });
                    self.publish_queue(&q, &cancel);
                    self.publish_event(
                        DownloadEvent::chapter_error(
                            &title_id,
                            job.chapter_number,
                            err.to_string(),
                        ),
                        &cancel,
                    );
                    // Consumed even on failure, so it is never retried
                    // within this queue's lifetime
                    q.finish_current();
                }
            }
        }
    }

    async fn process_chapter(
        &self,
        title_id: &str,
        job: &DownloadJob,
        queue: &Arc<Mutex<TitleQueue>>,
        cancel: &CancellationToken,
    ) -> Result<ChapterOutcome, DownloadError> {
        let provider = self
            .registry
            .get(&job.provider_id)
            .ok_or_else(|| DownloadError::unknown_provider(&job.provider_id))?;

        let pages = provider
            .fetch_chapter_pages(&job.chapter_url)
            .await
            .map_err(|e| map_provider_error(&job.provider_id, e))?;
        if pages.is_empty() {
            return Err(DownloadError::no_pages_found(&job.chapter_url));
        }
        let images_total = u32::try_from(pages.len()).unwrap_or(u32::MAX);

        {
            let mut q = queue.lock().await;
            q.set_state(ChapterDownloadState::Downloading {
                images_downloaded: 0,
                images_total,
            });
            self.publish_queue(&q, cancel);
            self.publish_event(
                DownloadEvent::chapter_pages(title_id, job.chapter_number, images_total),
                cancel,
            );
        }

        let provider_headers = provider.image_request_headers();
        let mut images: Vec<Option<FetchedImage>> = (0..pages.len()).map(|_| None).collect();
        let mut downloaded = 0u32;

        for (batch_index, batch) in pages.chunks(PAGE_BATCH_SIZE).enumerate() {
            if cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }

            let mut in_flight = FuturesUnordered::new();
            for (offset, page) in batch.iter().enumerate() {
                let index = batch_index * PAGE_BATCH_SIZE + offset;
                let headers = merge_headers(&provider_headers, page.headers.as_deref());
                let fetcher = Arc::clone(&self.fetcher);
                let url = page.url.clone();
                in_flight.push(async move {
                    let result = fetcher.fetch(&url, &headers).await;
                    (index, url, result)
                });
            }

            // Progress is republished per image, not per batch; a failure
            // aborts the chapter and drops the rest of the batch.
            while let Some((index, url, result)) = in_flight.next().await {
                let image = result
                    .map_err(|e| DownloadError::image_fetch_failed(&url, e.to_string()))?;
                images[index] = Some(image);
                downloaded += 1;

                let mut q = queue.lock().await;
                q.set_state(ChapterDownloadState::Downloading {
                    images_downloaded: downloaded,
                    images_total,
                });
                self.publish_queue(&q, cancel);
                self.publish_event(
                    DownloadEvent::chapter_progress(
                        title_id,
                        job.chapter_number,
                        downloaded,
                        images_total,
                    ),
                    cancel,
                );
            }
        }

        let mut payloads = Vec::with_capacity(images.len());
        for image in images.into_iter().flatten() {
            let optimized = self
                .pipeline
                .optimize(image.bytes, &image.content_type)
                .await
                .map_err(|e| DownloadError::other(e.to_string()))?;
            payloads.push(ImagePayload {
                bytes: optimized.bytes,
                content_type: optimized.content_type,
            });
        }

        {
            let mut q = queue.lock().await;
            q.set_state(ChapterDownloadState::Uploading);
            self.publish_queue(&q, cancel);
            self.publish_event(
                DownloadEvent::chapter_uploading(title_id, job.chapter_number),
                cancel,
            );
        }

        let existing = self
            .store
            .find_chapter(title_id, job.chapter_number)
            .await
            .map_err(|e| DownloadError::store(e.to_string()))?;
        if let Some(existing) = &existing {
            debug!(
                target: "inkvault.download",
                title_id = %title_id,
                chapter = job.chapter_number,
                record_id = %existing.id,
                "replacing existing chapter record"
            );
        }

        let record = self
            .store
            .upsert_chapter(NewChapterRecord {
                title_id: title_id.to_string(),
                chapter_number: job.chapter_number,
                episode_title: job.episode_title.clone(),
                images: payloads,
            })
            .await
            .map_err(|e| DownloadError::upload_failed(e.to_string()))?;

        self.recompute_summary(title_id).await?;

        Ok(ChapterOutcome {
            record_id: record.id,
            size_bytes: record.size_bytes,
            images_total,
        })
    }

    /// Recompute the title's aggregate counters from its stored chapters.
    /// Titles without a summary row are tolerated: the chapter record is
    /// the source of truth and the summary is derived bookkeeping.
    async fn recompute_summary(&self, title_id: &str) -> Result<(), DownloadError> {
        let chapters = self
            .store
            .list_chapters(title_id)
            .await
            .map_err(|e| DownloadError::store(e.to_string()))?;
        let size_on_disk: u64 = chapters.iter().map(|c| c.size_bytes).sum();
        let chapters_downloaded = u32::try_from(chapters.len()).unwrap_or(u32::MAX);

        match self.store.title_summary(title_id).await {
            Ok(mut summary) => {
                summary.chapters_downloaded = chapters_downloaded;
                summary.size_on_disk = size_on_disk;
                self.store
                    .update_title_summary(summary)
                    .await
                    .map_err(|e| DownloadError::store(e.to_string()))
            }
            Err(StoreError::TitleNotFound { .. }) => {
                debug!(
                    target: "inkvault.download",
                    title_id = %title_id,
                    "no title summary to update"
                );
                Ok(())
            }
            Err(e) => Err(DownloadError::store(e.to_string())),
        }
    }

    /// Publish the queue's snapshot unless its token is cancelled. Callers
    /// hold the queue lock, which serializes publishes against `cancel()`.
    fn publish_queue(&self, queue: &TitleQueue, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            return;
        }
        self.emitter.emit(DownloadEvent::snapshot(queue.snapshot()));
    }

    fn publish_event(&self, event: DownloadEvent, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            return;
        }
        self.emitter.emit(event);
    }
}

struct ChapterOutcome {
    record_id: String,
    size_bytes: u64,
    images_total: u32,
}

/// Provider-level image headers merged under per-page overrides; overrides
/// win on case-insensitive name collisions.
fn merge_headers(
    provider: &[(String, String)],
    overrides: Option<&[(String, String)]>,
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = provider.to_vec();
    if let Some(overrides) = overrides {
        for (name, value) in overrides {
            merged.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            merged.push((name.clone(), value.clone()));
        }
    }
    merged
}

fn map_provider_error(provider_id: &str, err: ProviderError) -> DownloadError {
    match err {
        ProviderError::NoPagesFound { chapter_url } => DownloadError::no_pages_found(chapter_url),
        ProviderError::Unavailable { .. } | ProviderError::Network(_) => {
            DownloadError::provider_unavailable(provider_id, err.to_string())
        }
        other => DownloadError::other(other.to_string()),
    }
}
