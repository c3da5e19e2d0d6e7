//! Send consumer
//!
//! Drains the item queue one item at a time. Every item goes through four
//! steps: create the execution, record the request, deliver, record the
//! response. Delivery failures become an error response on the execution;
//! bookkeeping failures are logged and the loop moves on to the next item.

use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::item_queue::ItemQueue;
use crate::errors::{AppResult, DeliveryResult};
use crate::models::{ExecutionStatus, ExecutionTrigger, Integration, QueueItem};
use crate::services::{AuthProvider, DeliveryOutcome, ExecutionService, SendStrategy};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Items whose execution record could not be written
    pub bookkeeping_failures: usize,
}

pub struct SendConsumer {
    integration: Integration,
    trigger: ExecutionTrigger,
    queue: Arc<ItemQueue>,
    executions: ExecutionService,
    auth: Arc<dyn AuthProvider>,
    sender: Arc<dyn SendStrategy>,
    error_status_code: u16,
}

impl SendConsumer {
    pub fn new(
        integration: Integration,
        trigger: ExecutionTrigger,
        queue: Arc<ItemQueue>,
        executions: ExecutionService,
        auth: Arc<dyn AuthProvider>,
        sender: Arc<dyn SendStrategy>,
        error_status_code: u16,
    ) -> Self {
        Self {
            integration,
            trigger,
            queue,
            executions,
            auth,
            sender,
            error_status_code,
        }
    }

    /// Process items until the queue is drained and closed, or until cancelled
    ///
    /// An item already taken from the queue always completes its lifecycle.
    pub async fn run(&self, cancel: &CancellationToken) -> ConsumerReport {
        let mut report = ConsumerReport::default();

        while let Some(item) = self.queue.pop(cancel).await {
            report.processed += 1;
            match self.process_item(&item).await {
                Ok(ExecutionStatus::Success) => report.succeeded += 1,
                Ok(status) => {
                    report.failed += 1;
                    warn!("Item {} finished with status {}", item.id, status);
                }
                Err(e) => {
                    report.bookkeeping_failures += 1;
                    error!(
                        "Execution bookkeeping failed for item {} of integration {}: {}",
                        item.id, self.integration.id, e
                    );
                }
            }
        }

        if cancel.is_cancelled() {
            info!(
                "Send consumer for integration '{}' cancelled after {} item(s)",
                self.integration.name, report.processed
            );
        }
        // Lets a producer blocked on a full queue give up
        self.queue.close();

        report
    }

    async fn process_item(&self, item: &QueueItem) -> AppResult<ExecutionStatus> {
        let mut execution = self
            .executions
            .init_execution(
                &self.integration,
                &self.trigger,
                Some(format!("Deliver item {}", item.id)),
            )
            .await?;

        let body = self
            .executions
            .add_request_to_execution(&mut execution, item)
            .await?;

        let (status_code, response_body) = match self.send(&item.id, &body).await {
            Ok(outcome) => (outcome.status_code, outcome.body),
            Err(e) => {
                warn!("Delivery of item {} failed: {}", item.id, e);
                (self.error_status_code, e.to_string())
            }
        };

        let status = self
            .executions
            .add_response_to_execution(&mut execution, status_code, response_body)
            .await?;

        info!(
            "Item {} delivered with status {} (execution {} {})",
            item.id, status_code, execution.id, status
        );
        Ok(status)
    }

    async fn send(&self, item_id: &str, body: &str) -> DeliveryResult<DeliveryOutcome> {
        let token = self
            .auth
            .obtain_access_token(&self.integration.target)
            .await?;
        self.sender
            .send(&self.integration.target, item_id, body, &token)
            .await
    }
}
