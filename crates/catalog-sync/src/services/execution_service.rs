//! Execution lifecycle operations
//!
//! The three bookkeeping steps the send consumer performs around each
//! delivery. Each step validates the transition on a copy of the execution,
//! commits it through the store and only then updates the caller's value, so
//! a failed write never leaves the in-memory state ahead of the database.

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::database::repositories::ExecutionStore;
use crate::errors::{AppError, AppResult, DeliveryError};
use crate::models::{
    Execution, ExecutionRecord, ExecutionResponse, ExecutionStatus, ExecutionTrigger, Integration,
    QueueItem,
};

#[derive(Clone)]
pub struct ExecutionService {
    store: Arc<dyn ExecutionStore>,
}

impl ExecutionService {
    pub fn new(store: Arc<dyn ExecutionStore>) -> Self {
        Self { store }
    }

    /// Persist a new execution in STARTED
    pub async fn init_execution(
        &self,
        integration: &Integration,
        trigger: &ExecutionTrigger,
        description: Option<String>,
    ) -> AppResult<Execution> {
        let execution = Execution::start(integration.id, trigger, description, Utc::now());
        self.store.create_execution(&execution).await?;

        debug!(
            "Execution {} started for integration {} ({})",
            execution.id, integration.id, trigger
        );
        Ok(execution)
    }

    /// Record the item's wire form and move STARTED -> PENDING
    pub async fn add_request_to_execution(
        &self,
        execution: &mut Execution,
        item: &QueueItem,
    ) -> AppResult<String> {
        let body = item.to_wire().map_err(DeliveryError::from)?;

        let mut updated = execution.clone();
        updated.record_request(body.clone())?;
        self.store
            .transition_execution(&updated, ExecutionStatus::Started)
            .await?;

        *execution = updated;
        Ok(body)
    }

    /// Attach the target's answer and move PENDING -> SUCCESS or ERROR
    pub async fn add_response_to_execution(
        &self,
        execution: &mut Execution,
        status_code: u16,
        body: String,
    ) -> AppResult<ExecutionStatus> {
        let response = ExecutionResponse::new(execution.id, status_code, body);

        let mut updated = execution.clone();
        let status = updated.record_response(&response)?;
        self.store.complete_execution(&updated, &response).await?;

        *execution = updated;
        Ok(status)
    }

    /// One execution with its response, if any
    pub async fn get(&self, id: Uuid) -> AppResult<ExecutionRecord> {
        let execution = self
            .store
            .find_execution(id)
            .await?
            .ok_or_else(|| AppError::not_found("execution", id))?;
        let response = self.store.find_response(id).await?;

        Ok(ExecutionRecord {
            execution,
            response,
        })
    }

    /// Recent executions of an integration, newest first
    pub async fn history(&self, integration_id: Uuid, limit: u64) -> AppResult<Vec<ExecutionRecord>> {
        Ok(self.store.find_by_integration(integration_id, limit).await?)
    }
}
