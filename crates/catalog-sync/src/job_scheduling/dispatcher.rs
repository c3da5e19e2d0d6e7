//! Task dispatcher
//!
//! A single worker drains the priority queue and runs each task to
//! completion before taking the next, so no two sync jobs ever overlap.
//! Errors and panics are contained at the task boundary and never stop the
//! worker.

use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::task_queue::PriorityTaskQueue;
use super::types::{JobSchedulingError, PriorityTask, TaskSummary};

/// Executes one dequeued task
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run_task(&self, task: &PriorityTask, cancel: &CancellationToken) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatcherStats {
    pub pending: usize,
    pub completed: u64,
    pub failed: u64,
    pub panicked: u64,
}

pub struct TaskDispatcher {
    queue: Arc<PriorityTaskQueue>,
    runner: Arc<dyn TaskRunner>,
    running: RwLock<Option<TaskSummary>>,
    completed: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

impl TaskDispatcher {
    pub fn new(queue: Arc<PriorityTaskQueue>, runner: Arc<dyn TaskRunner>) -> Self {
        Self {
            queue,
            runner,
            running: RwLock::new(None),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
        }
    }

    /// Enqueue a task for the worker
    pub async fn execute(&self, task: PriorityTask) -> Result<(), JobSchedulingError> {
        let summary = task.summary();
        self.queue.push(task).await.map_err(|e| match e {
            JobSchedulingError::QueueClosed => JobSchedulingError::DispatcherStopped,
            other => other,
        })?;

        info!(
            "Enqueued {} task {} for integration '{}' ({})",
            summary.class, summary.id, summary.integration_name, summary.integration_id
        );
        Ok(())
    }

    /// Tasks not yet started, in the order they will run
    pub async fn peek_queue(&self) -> Vec<TaskSummary> {
        self.queue
            .peek()
            .await
            .iter()
            .map(PriorityTask::summary)
            .collect()
    }

    pub async fn running_task(&self) -> Option<TaskSummary> {
        self.running.read().await.clone()
    }

    pub async fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            pending: self.queue.len().await,
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }

    /// Run the worker until cancelled
    pub async fn run(&self, cancellation_token: CancellationToken) -> anyhow::Result<()> {
        info!("Starting task dispatcher");

        while let Some(task) = self.queue.pop(&cancellation_token).await {
            self.run_one(task, &cancellation_token).await;
        }

        self.queue.close();
        let remaining = self.queue.len().await;
        if remaining > 0 {
            info!("Task dispatcher stopping with {} task(s) not started", remaining);
        }
        info!("Task dispatcher stopped");
        Ok(())
    }

    async fn run_one(&self, task: PriorityTask, cancel: &CancellationToken) {
        let summary = task.summary();
        *self.running.write().await = Some(summary.clone());

        info!(
            "Running {} task {} for integration '{}'",
            summary.class, summary.id, summary.integration_name
        );
        let started = std::time::Instant::now();

        let outcome = AssertUnwindSafe(self.runner.run_task(&task, cancel))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                info!("Task {} completed in {:?}", summary.id, started.elapsed());
            }
            Ok(Err(e)) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    "Task {} for integration '{}' failed after {:?}: {:#}",
                    summary.id,
                    summary.integration_name,
                    started.elapsed(),
                    e
                );
            }
            Err(panic) => {
                self.panicked.fetch_add(1, Ordering::Relaxed);
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Task {} panicked: {}", summary.id, message);
            }
        }

        *self.running.write().await = None;
    }
}
