//! Bounded FIFO hand-off between one producer and one consumer
//!
//! `push` waits while the queue is full and `pop` waits while it is empty.
//! Closing the queue wakes both sides: further pushes fail and `pop` drains
//! what is left before returning `None`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use crate::job_scheduling::JobSchedulingError;
use crate::models::QueueItem;

#[derive(Debug)]
pub struct ItemQueue {
    items: Mutex<VecDeque<QueueItem>>,
    capacity: usize,
    closed: AtomicBool,
    not_empty: Notify,
    not_full: Notify,
}

impl ItemQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            closed: AtomicBool::new(false),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    pub async fn push(&self, item: QueueItem) -> Result<(), JobSchedulingError> {
        loop {
            if self.is_closed() {
                return Err(JobSchedulingError::QueueClosed);
            }

            {
                let mut items = self.items.lock().await;
                if items.len() < self.capacity {
                    items.push_back(item);
                    drop(items);
                    self.not_empty.notify_one();
                    return Ok(());
                }
            }

            self.not_full.notified().await;
        }
    }

    /// Take the oldest item, waiting while the queue is empty
    ///
    /// Cancellation is only observed here: `None` is returned as soon as the
    /// token fires, even if items remain.
    pub async fn pop(&self, cancel: &CancellationToken) -> Option<QueueItem> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            {
                let mut items = self.items.lock().await;
                if let Some(item) = items.pop_front() {
                    drop(items);
                    self.not_full.notify_one();
                    return Some(item);
                }
            }
            if self.is_closed() {
                return None;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                _ = self.not_empty.notified() => {}
            }
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.not_empty.notify_one();
        self.not_full.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Items waiting to be sent, oldest first; nothing is removed
    pub async fn snapshot(&self) -> Vec<QueueItem> {
        self.items.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
