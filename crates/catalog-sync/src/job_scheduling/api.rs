//! External API for the job scheduling system
//!
//! Monitoring views are read-only and never consume queued work.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::cron_scheduler::{RefreshOutcome, ScheduleManager, TriggerSummary};
use super::dispatcher::{DispatcherStats, TaskDispatcher};
use super::types::{JobSchedulingError, PriorityTask, TaskSummary};
use crate::database::repositories::IntegrationCatalog;
use crate::errors::AppResult;
use crate::ingestor::{ItemQueueRegistry, PendingItems};
use crate::models::ExecutionRecord;
use crate::services::ExecutionService;

#[derive(Clone)]
pub struct JobSchedulingApi {
    dispatcher: Arc<TaskDispatcher>,
    schedule_manager: Arc<ScheduleManager>,
    catalog: Arc<dyn IntegrationCatalog>,
    executions: ExecutionService,
    item_queues: Arc<ItemQueueRegistry>,
}

impl JobSchedulingApi {
    pub fn new(
        dispatcher: Arc<TaskDispatcher>,
        schedule_manager: Arc<ScheduleManager>,
        catalog: Arc<dyn IntegrationCatalog>,
        executions: ExecutionService,
        item_queues: Arc<ItemQueueRegistry>,
    ) -> Self {
        Self {
            dispatcher,
            schedule_manager,
            catalog,
            executions,
            item_queues,
        }
    }

    /// Jobs waiting for the dispatcher, in run order
    pub async fn pending_tasks(&self) -> Vec<TaskSummary> {
        self.dispatcher.peek_queue().await
    }

    /// The job currently being run, if any
    pub async fn running_task(&self) -> Option<TaskSummary> {
        self.dispatcher.running_task().await
    }

    /// Items fetched but not yet delivered by running jobs
    pub async fn pending_items(&self) -> Vec<PendingItems> {
        self.item_queues.snapshot().await
    }

    pub async fn installed_triggers(&self) -> Vec<TriggerSummary> {
        self.schedule_manager.installed_triggers().await
    }

    pub async fn dispatcher_stats(&self) -> DispatcherStats {
        self.dispatcher.stats().await
    }

    /// Queue a manual sync of one integration on behalf of `user_id`
    ///
    /// Returns the id of the queued task.
    pub async fn trigger_manual(&self, integration_id: Uuid, user_id: &str) -> AppResult<Uuid> {
        let integration = self
            .catalog
            .find_by_id(integration_id)
            .await?
            .ok_or(JobSchedulingError::IntegrationNotFound { id: integration_id })?;

        info!(
            "API: Manual sync of integration '{}' requested by {}",
            integration.name, user_id
        );

        let task = PriorityTask::manual(integration, user_id, Utc::now());
        let task_id = task.id;
        self.dispatcher.execute(task).await?;
        Ok(task_id)
    }

    /// Recent executions of an integration with their responses, newest first
    pub async fn execution_history(
        &self,
        integration_id: Uuid,
        limit: u64,
    ) -> AppResult<Vec<ExecutionRecord>> {
        self.executions.history(integration_id, limit).await
    }

    pub async fn refresh_schedule(&self) -> AppResult<RefreshOutcome> {
        self.schedule_manager.refresh().await
    }
}
