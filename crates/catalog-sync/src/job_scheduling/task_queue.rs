//! Priority task queue
//!
//! Pending tasks live in a min-heap (via `Reverse`) so the next task to run
//! is always the smallest under the `PriorityTask` ordering. A single worker
//! blocks in [`PriorityTaskQueue::pop`] until a task arrives, the queue is
//! closed or the cancellation token fires.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::types::{JobSchedulingError, PriorityTask};

#[derive(Debug, Default)]
pub struct PriorityTaskQueue {
    pending: Mutex<BinaryHeap<Reverse<PriorityTask>>>,
    sequence: AtomicU64,
    closed: AtomicBool,
    available: Notify,
}

impl PriorityTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, mut task: PriorityTask) -> Result<(), JobSchedulingError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(JobSchedulingError::QueueClosed);
        }

        task.sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Queued {} task {} for integration {}",
            task.class, task.id, task.integration.id
        );

        self.pending.lock().await.push(Reverse(task));
        self.available.notify_one();
        Ok(())
    }

    /// Remove the highest-priority task, waiting while the queue is empty
    ///
    /// Returns `None` once cancelled, or once closed and drained.
    pub async fn pop(&self, cancel: &CancellationToken) -> Option<PriorityTask> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            {
                let mut pending = self.pending.lock().await;
                if let Some(Reverse(task)) = pending.pop() {
                    return Some(task);
                }
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                _ = self.available.notified() => {}
            }
        }
    }

    /// Snapshot of pending tasks in dispatch order; the queue is left untouched
    pub async fn peek(&self) -> Vec<PriorityTask> {
        let pending = self.pending.lock().await;
        let mut tasks: Vec<PriorityTask> = pending.iter().map(|Reverse(task)| task.clone()).collect();
        tasks.sort();
        tasks
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stop accepting tasks and wake the waiting worker
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.available.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
