//! In-memory fakes of the engine's collaborators for unit tests

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::database::repositories::{ExecutionStore, IntegrationCatalog};
use crate::errors::{
    DeliveryError, DeliveryResult, RepositoryError, RepositoryResult, SourceError, SourceResult,
};
use crate::models::{
    DeliveryTarget, Execution, ExecutionRecord, ExecutionResponse, ExecutionStatus, Integration,
    IntegrationCreateRequest, IntegrationUpdateRequest,
};
use crate::services::{AuthProvider, DeliveryOutcome, SendStrategy};
use crate::sources::{PageSource, SourceRecord};

pub fn integration(name: &str, cron: &str) -> Integration {
    let now = Utc::now();
    Integration {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        cron_expression: cron.to_string(),
        target: DeliveryTarget {
            url: "https://shop.example.com/items".to_string(),
            token_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
        },
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    integrations: Mutex<Vec<Integration>>,
    pub fail_loads: AtomicBool,
}

impl MemoryCatalog {
    pub fn with(integrations: Vec<Integration>) -> Self {
        Self {
            integrations: Mutex::new(integrations),
            ..Default::default()
        }
    }
}

#[async_trait]
impl IntegrationCatalog for MemoryCatalog {
    async fn load_all(&self) -> RepositoryResult<Vec<Integration>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sea_orm::DbErr::Custom(
                "catalog unavailable".to_string(),
            )));
        }
        Ok(self.integrations.lock().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Integration>> {
        Ok(self
            .integrations
            .lock()
            .await
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn create(&self, request: IntegrationCreateRequest) -> RepositoryResult<Integration> {
        let now = Utc::now();
        let integration = Integration {
            id: Uuid::new_v4(),
            name: request.name,
            description: request.description,
            cron_expression: request.cron_expression,
            target: request.target,
            created_at: now,
            updated_at: now,
        };
        self.integrations.lock().await.push(integration.clone());
        Ok(integration)
    }

    async fn update(
        &self,
        id: Uuid,
        request: IntegrationUpdateRequest,
    ) -> RepositoryResult<Integration> {
        let mut integrations = self.integrations.lock().await;
        let existing = integrations
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| RepositoryError::not_found("integrations", "id", id))?;

        existing.name = request.name;
        existing.description = request.description;
        existing.cron_expression = request.cron_expression;
        existing.target = request.target;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut integrations = self.integrations.lock().await;
        let before = integrations.len();
        integrations.retain(|i| i.id != id);
        if integrations.len() == before {
            return Err(RepositoryError::not_found("integrations", "id", id));
        }
        Ok(())
    }
}

/// Applies the same compare-and-set rules as the SeaORM store
#[derive(Default)]
pub struct MemoryExecutionStore {
    pub executions: Mutex<HashMap<Uuid, Execution>>,
    pub responses: Mutex<HashMap<Uuid, ExecutionResponse>>,
    rejected_descriptions: Mutex<HashSet<String>>,
}

impl MemoryExecutionStore {
    /// Make `create_execution` fail for the execution that delivers `item_id`
    pub async fn reject_item(&self, item_id: &str) {
        self.rejected_descriptions
            .lock()
            .await
            .insert(format!("Deliver item {item_id}"));
    }

    fn conflict(execution: &Execution, expected: ExecutionStatus) -> RepositoryError {
        RepositoryError::ConcurrentModification {
            table: "executions".to_string(),
            id: execution.id.to_string(),
            expected: expected.to_string(),
        }
    }

    pub async fn statuses(&self) -> Vec<ExecutionStatus> {
        self.executions
            .lock()
            .await
            .values()
            .map(|e| e.status)
            .collect()
    }
}

#[async_trait]
impl ExecutionStore for MemoryExecutionStore {
    async fn create_execution(&self, execution: &Execution) -> RepositoryResult<()> {
        if let Some(description) = &execution.description
            && self.rejected_descriptions.lock().await.contains(description)
        {
            return Err(RepositoryError::Database(sea_orm::DbErr::Custom(
                "insert rejected".to_string(),
            )));
        }
        self.executions
            .lock()
            .await
            .insert(execution.id, execution.clone());
        Ok(())
    }

    async fn transition_execution(
        &self,
        execution: &Execution,
        from: ExecutionStatus,
    ) -> RepositoryResult<()> {
        let mut executions = self.executions.lock().await;
        match executions.get_mut(&execution.id) {
            Some(stored) if stored.status == from => {
                *stored = execution.clone();
                Ok(())
            }
            _ => Err(Self::conflict(execution, from)),
        }
    }

    async fn complete_execution(
        &self,
        execution: &Execution,
        response: &ExecutionResponse,
    ) -> RepositoryResult<()> {
        let mut executions = self.executions.lock().await;
        let mut responses = self.responses.lock().await;
        if responses.contains_key(&execution.id) {
            return Err(Self::conflict(execution, ExecutionStatus::Pending));
        }
        match executions.get_mut(&execution.id) {
            Some(stored) if stored.status == ExecutionStatus::Pending => {
                *stored = execution.clone();
                responses.insert(execution.id, response.clone());
                Ok(())
            }
            _ => Err(Self::conflict(execution, ExecutionStatus::Pending)),
        }
    }

    async fn find_execution(&self, id: Uuid) -> RepositoryResult<Option<Execution>> {
        Ok(self.executions.lock().await.get(&id).cloned())
    }

    async fn find_response(
        &self,
        execution_id: Uuid,
    ) -> RepositoryResult<Option<ExecutionResponse>> {
        Ok(self.responses.lock().await.get(&execution_id).cloned())
    }

    async fn find_by_integration(
        &self,
        integration_id: Uuid,
        limit: u64,
    ) -> RepositoryResult<Vec<ExecutionRecord>> {
        let executions = self.executions.lock().await;
        let responses = self.responses.lock().await;

        let mut records: Vec<ExecutionRecord> = executions
            .values()
            .filter(|e| e.integration_id == integration_id)
            .map(|e| ExecutionRecord {
                execution: e.clone(),
                response: responses.get(&e.id).cloned(),
            })
            .collect();
        records.sort_by(|a, b| b.execution.started_at.cmp(&a.execution.started_at));
        records.truncate(limit as usize);
        Ok(records)
    }
}

/// Serves fixed pages; any page past the end is empty
#[derive(Default)]
pub struct PagedSource {
    pages: Vec<Vec<SourceRecord>>,
    fail_on_page: Option<u32>,
    pub requests: AtomicU32,
}

impl PagedSource {
    /// Pages of `sizes[i]` records each, ids `p{page}-{n}`
    pub fn with_page_sizes(sizes: &[usize]) -> Self {
        let pages = sizes
            .iter()
            .enumerate()
            .map(|(index, size)| {
                (0..*size)
                    .map(|n| {
                        let id = format!("p{}-{}", index + 1, n);
                        SourceRecord::new(id.clone(), serde_json::json!({ "id": id }))
                    })
                    .collect()
            })
            .collect();
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, page: u32) -> Self {
        self.fail_on_page = Some(page);
        self
    }
}

#[async_trait]
impl PageSource for PagedSource {
    async fn fetch_page(&self, page: u32) -> SourceResult<Vec<SourceRecord>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_page == Some(page) {
            return Err(SourceError::Http {
                status: 503,
                message: "upstream unavailable".to_string(),
            });
        }
        Ok(self
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> String {
        "paged test source".to_string()
    }
}

pub struct StaticAuth(pub Option<String>);

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn obtain_access_token(&self, _target: &DeliveryTarget) -> DeliveryResult<String> {
        self.0
            .clone()
            .ok_or_else(|| DeliveryError::authentication("no token"))
    }
}

/// Answers every delivery with a fixed status and records the item ids
pub struct RecordingSender {
    status_code: u16,
    delay: Duration,
    pub sent: Mutex<Vec<String>>,
}

impl RecordingSender {
    pub fn answering(status_code: u16) -> Self {
        Self {
            status_code,
            delay: Duration::ZERO,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn sent_ids(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl SendStrategy for RecordingSender {
    async fn send(
        &self,
        _target: &DeliveryTarget,
        item_id: &str,
        _body: &str,
        _access_token: &str,
    ) -> DeliveryResult<DeliveryOutcome> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.sent.lock().await.push(item_id.to_string());
        Ok(DeliveryOutcome {
            status_code: self.status_code,
            body: format!("status {}", self.status_code),
        })
    }
}

/// Records deliveries like `RecordingSender` but panics for any target
/// whose url mentions `explode`
#[derive(Default)]
pub struct ExplodingSender {
    sent: Mutex<Vec<String>>,
}

impl ExplodingSender {
    pub async fn sent_ids(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl SendStrategy for ExplodingSender {
    async fn send(
        &self,
        target: &DeliveryTarget,
        item_id: &str,
        _body: &str,
        _access_token: &str,
    ) -> DeliveryResult<DeliveryOutcome> {
        if target.url.contains("explode") {
            panic!("sender exploded on item {item_id}");
        }
        self.sent.lock().await.push(item_id.to_string());
        Ok(DeliveryOutcome {
            status_code: 200,
            body: "ok".to_string(),
        })
    }
}
