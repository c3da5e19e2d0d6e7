//! Whole-integration sync job
//!
//! Runs one fetch producer and one send consumer over a fresh item queue.
//! The consumer is spawned on its own task and the producer runs inline; the
//! job returns once the consumer has drained everything the producer queued.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use super::fetch_producer::FetchProducer;
use super::item_queue::ItemQueue;
use super::send_consumer::SendConsumer;
use crate::config::DeliveryConfig;
use crate::job_scheduling::{PriorityTask, TaskRunner, TaskSummary};
use crate::models::QueueItem;
use crate::services::{AuthProvider, ExecutionService, SendStrategy};
use crate::sources::PageSource;

/// Items waiting in one running job's queue
#[derive(Debug, Clone, Serialize)]
pub struct PendingItems {
    pub task: TaskSummary,
    pub items: Vec<QueueItem>,
}

/// Item queues of the jobs currently running, for monitoring
#[derive(Debug, Default)]
pub struct ItemQueueRegistry {
    active: RwLock<HashMap<Uuid, (TaskSummary, Arc<ItemQueue>)>>,
}

impl ItemQueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, task: TaskSummary, queue: Arc<ItemQueue>) {
        self.active.write().await.insert(task.id, (task, queue));
    }

    pub async fn unregister(&self, task_id: Uuid) {
        self.active.write().await.remove(&task_id);
    }

    /// Non-destructive copy of every active queue
    pub async fn snapshot(&self) -> Vec<PendingItems> {
        let queues: Vec<(TaskSummary, Arc<ItemQueue>)> =
            self.active.read().await.values().cloned().collect();

        let mut pending = Vec::with_capacity(queues.len());
        for (task, queue) in queues {
            pending.push(PendingItems {
                task,
                items: queue.snapshot().await,
            });
        }
        pending
    }
}

/// Closes the item queue when the consumer task ends, even by unwinding,
/// so a producer parked on a full queue is released.
struct CloseOnDrop(Arc<ItemQueue>);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}

pub struct IntegrationJobExecutor {
    source: Arc<dyn PageSource>,
    executions: ExecutionService,
    auth: Arc<dyn AuthProvider>,
    sender: Arc<dyn SendStrategy>,
    registry: Arc<ItemQueueRegistry>,
    item_queue_capacity: usize,
    error_status_code: u16,
}

impl IntegrationJobExecutor {
    pub fn new(
        source: Arc<dyn PageSource>,
        executions: ExecutionService,
        auth: Arc<dyn AuthProvider>,
        sender: Arc<dyn SendStrategy>,
        registry: Arc<ItemQueueRegistry>,
        config: &DeliveryConfig,
    ) -> Self {
        Self {
            source,
            executions,
            auth,
            sender,
            registry,
            item_queue_capacity: config.item_queue_capacity,
            error_status_code: config.error_status_code,
        }
    }
}

#[async_trait]
impl TaskRunner for IntegrationJobExecutor {
    async fn run_task(&self, task: &PriorityTask, cancel: &CancellationToken) -> anyhow::Result<()> {
        let queue = Arc::new(ItemQueue::new(self.item_queue_capacity));
        self.registry.register(task.summary(), queue.clone()).await;

        let consumer = SendConsumer::new(
            task.integration.clone(),
            task.trigger(),
            queue.clone(),
            self.executions.clone(),
            self.auth.clone(),
            self.sender.clone(),
            self.error_status_code,
        );
        let consumer_cancel = cancel.child_token();
        let close_guard = CloseOnDrop(queue.clone());
        let consumer_handle = tokio::spawn(async move {
            let _close_guard = close_guard;
            consumer.run(&consumer_cancel).await
        });

        let fetch_result = FetchProducer::new(self.source.clone(), queue.clone())
            .run()
            .await;
        let consumer_result = consumer_handle.await;

        self.registry.unregister(task.id).await;

        let report = match consumer_result {
            Ok(report) => report,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => return Err(anyhow::anyhow!("Send consumer task failed: {e}")),
        };
        info!(
            "Integration '{}': {} item(s) processed, {} succeeded, {} failed, {} bookkeeping failure(s)",
            task.integration.name,
            report.processed,
            report.succeeded,
            report.failed,
            report.bookkeeping_failures
        );

        let fetch = fetch_result.map_err(|e| {
            anyhow::Error::new(e).context(format!(
                "Fetch for integration '{}' aborted",
                task.integration.name
            ))
        })?;
        info!(
            "Integration '{}': fetched {} item(s) over {} page request(s)",
            task.integration.name, fetch.items_enqueued, fetch.pages_requested
        );

        Ok(())
    }
}
