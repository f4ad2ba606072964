//! Per-title download queue.
//!
//! `TitleQueue` is a pure synchronous state container: no locks, no IO, no
//! spawning. The orchestrator owns synchronization and drives transitions;
//! everything here is directly unit-testable.
//!
//! Invariants maintained:
//! - at most one job is in flight (`current`);
//! - a chapter number appears at most once across pending, current, and
//!   completed;
//! - `completed` only grows for the lifetime of the queue;
//! - snapshots are immutable values, detached from later mutations.

use std::collections::{BTreeSet, VecDeque};

use inkvault_core::{ChapterDownloadState, DownloadJob, ProgressSnapshot};

#[derive(Debug)]
struct CurrentJob {
    job: DownloadJob,
    state: ChapterDownloadState,
}

#[derive(Debug)]
pub struct TitleQueue {
    title_id: String,
    title_name: String,
    pending: VecDeque<DownloadJob>,
    current: Option<CurrentJob>,
    completed: BTreeSet<u32>,
    processing: bool,
}

impl TitleQueue {
    #[must_use]
    pub fn new(title_id: impl Into<String>, title_name: impl Into<String>) -> Self {
        Self {
            title_id: title_id.into(),
            title_name: title_name.into(),
            pending: VecDeque::new(),
            current: None,
            completed: BTreeSet::new(),
            processing: true,
        }
    }

    #[must_use]
    pub fn title_id(&self) -> &str {
        &self.title_id
    }

    /// Whether `chapter_number` is anywhere in this queue's lifetime:
    /// pending, in flight, or already consumed.
    #[must_use]
    pub fn contains_chapter(&self, chapter_number: u32) -> bool {
        self.completed.contains(&chapter_number)
            || self
                .current
                .as_ref()
                .is_some_and(|c| c.job.chapter_number == chapter_number)
            || self
                .pending
                .iter()
                .any(|j| j.chapter_number == chapter_number)
    }

    /// Append jobs in order, silently dropping chapter numbers this queue
    /// has already seen. Returns how many were accepted.
    pub fn enqueue_dedup(&mut self, jobs: impl IntoIterator<Item = DownloadJob>) -> usize {
        let mut accepted = 0;
        for job in jobs {
            if self.contains_chapter(job.chapter_number) {
                continue;
            }
            self.pending.push_back(job);
            accepted += 1;
        }
        accepted
    }

    /// Take the next job and make it current, in `FetchingPages` state.
    ///
    /// Returns `None` when the queue is drained. Must not be called while a
    /// job is already in flight.
    pub fn pop_next(&mut self) -> Option<DownloadJob> {
        debug_assert!(self.current.is_none(), "pop_next with a job in flight");
        let job = self.pending.pop_front()?;
        self.current = Some(CurrentJob {
            job: job.clone(),
            state: ChapterDownloadState::FetchingPages,
        });
        Some(job)
    }

    /// Update the state of the in-flight job. No-op when nothing is in
    /// flight (the queue may have been cleared by a cancel).
    pub fn set_state(&mut self, state: ChapterDownloadState) {
        if let Some(current) = self.current.as_mut() {
            current.state = state;
        }
    }

    /// Retire the in-flight job, recording its chapter number as consumed
    /// so it is never retried within this queue's lifetime.
    pub fn finish_current(&mut self) {
        if let Some(current) = self.current.take() {
            self.completed.insert(current.job.chapter_number);
        }
    }

    /// Mark the drained queue as no longer processing.
    pub fn mark_drained(&mut self) {
        self.current = None;
        self.processing = false;
    }

    /// Drop all pending and in-flight work on cancellation. The completed
    /// set is kept for the final snapshot.
    pub fn clear_for_cancel(&mut self) {
        self.pending.clear();
        self.current = None;
        self.processing = false;
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.current.is_none()
    }

    /// Point-in-time projection of this queue.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            title_id: self.title_id.clone(),
            title_name: self.title_name.clone(),
            current_chapter: self.current.as_ref().map(|c| c.state.clone()),
            queued_chapter_numbers: self.pending.iter().map(|j| j.chapter_number).collect(),
            completed_chapter_numbers: self.completed.iter().copied().collect(),
            is_processing: self.processing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(n: u32) -> DownloadJob {
        DownloadJob::new(
            n,
            format!("https://scripted.example/read/t1/{n}"),
            format!("Chapter {n}"),
            "scripted",
        )
    }

    #[test]
    fn test_new_queue_is_processing_and_idle() {
        let queue = TitleQueue::new("t1", "Example");
        assert!(queue.is_idle());

        let snapshot = queue.snapshot();
        assert!(snapshot.is_processing);
        assert!(snapshot.current_chapter.is_none());
        assert!(snapshot.queued_chapter_numbers.is_empty());
    }

    #[test]
    fn test_enqueue_preserves_order() {
        let mut queue = TitleQueue::new("t1", "Example");
        queue.enqueue_dedup(vec![job(3), job(1), job(2)]);

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.queued_chapter_numbers, vec![3, 1, 2]);
    }

    #[test]
    fn test_enqueue_dedups_within_batch() {
        let mut queue = TitleQueue::new("t1", "Example");
        let accepted = queue.enqueue_dedup(vec![job(1), job(1), job(2)]);
        assert_eq!(accepted, 2);
    }

    #[test]
    fn test_enqueue_dedups_against_pending_current_and_completed() {
        let mut queue = TitleQueue::new("t1", "Example");
        queue.enqueue_dedup(vec![job(1), job(2)]);

        // 1 becomes current
        queue.pop_next().unwrap();
        // against current and pending
        assert_eq!(queue.enqueue_dedup(vec![job(1), job(2), job(3)]), 1);

        queue.finish_current();
        // against completed
        assert_eq!(queue.enqueue_dedup(vec![job(1), job(4)]), 1);

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.queued_chapter_numbers, vec![2, 3, 4]);
        assert_eq!(snapshot.completed_chapter_numbers, vec![1]);
    }

    #[test]
    fn test_pop_next_is_fifo_and_sets_fetching_pages() {
        let mut queue = TitleQueue::new("t1", "Example");
        queue.enqueue_dedup(vec![job(2), job(1)]);

        let first = queue.pop_next().unwrap();
        assert_eq!(first.chapter_number, 2);
        assert_eq!(
            queue.snapshot().current_chapter,
            Some(ChapterDownloadState::FetchingPages)
        );
    }

    #[test]
    fn test_completed_grows_monotonically_and_sorted() {
        let mut queue = TitleQueue::new("t1", "Example");
        queue.enqueue_dedup(vec![job(5), job(2), job(9)]);

        for _ in 0..3 {
            queue.pop_next().unwrap();
            queue.finish_current();
        }

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.completed_chapter_numbers, vec![2, 5, 9]);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_snapshot_is_detached_from_later_mutations() {
        let mut queue = TitleQueue::new("t1", "Example");
        queue.enqueue_dedup(vec![job(1), job(2)]);
        let before = queue.snapshot();

        queue.pop_next().unwrap();
        queue.set_state(ChapterDownloadState::Uploading);

        assert_eq!(before.queued_chapter_numbers, vec![1, 2]);
        assert!(before.current_chapter.is_none());
    }

    #[test]
    fn test_set_state_without_current_is_a_no_op() {
        let mut queue = TitleQueue::new("t1", "Example");
        queue.set_state(ChapterDownloadState::Uploading);
        assert!(queue.snapshot().current_chapter.is_none());
    }

    #[test]
    fn test_clear_for_cancel_keeps_completed() {
        let mut queue = TitleQueue::new("t1", "Example");
        queue.enqueue_dedup(vec![job(1), job(2), job(3)]);
        queue.pop_next().unwrap();
        queue.finish_current();
        queue.pop_next().unwrap();

        queue.clear_for_cancel();

        let snapshot = queue.snapshot();
        assert!(!snapshot.is_processing);
        assert!(snapshot.current_chapter.is_none());
        assert!(snapshot.queued_chapter_numbers.is_empty());
        assert_eq!(snapshot.completed_chapter_numbers, vec![1]);
    }

    #[test]
    fn test_mark_drained_stops_processing() {
        let mut queue = TitleQueue::new("t1", "Example");
        queue.mark_drained();
        assert!(!queue.snapshot().is_processing);
    }
}
