//! Collaborator traits implemented by the SeaORM repositories
//!
//! The scheduler and the send consumer only see these traits, which keeps
//! them testable against in-memory fakes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RepositoryResult;
use crate::models::{
    Execution, ExecutionRecord, ExecutionResponse, ExecutionStatus, Integration,
    IntegrationCreateRequest, IntegrationUpdateRequest,
};

/// Persisted integration definitions
#[async_trait]
pub trait IntegrationCatalog: Send + Sync {
    async fn load_all(&self) -> RepositoryResult<Vec<Integration>>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Integration>>;

    async fn create(&self, request: IntegrationCreateRequest) -> RepositoryResult<Integration>;

    async fn update(
        &self,
        id: Uuid,
        request: IntegrationUpdateRequest,
    ) -> RepositoryResult<Integration>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}

/// Durable record of executions and their responses
///
/// Every method commits before returning.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Insert a freshly started execution
    async fn create_execution(&self, execution: &Execution) -> RepositoryResult<()>;

    /// Persist `execution` only if the stored row is still in `from`
    async fn transition_execution(
        &self,
        execution: &Execution,
        from: ExecutionStatus,
    ) -> RepositoryResult<()>;

    /// Move a PENDING execution to its terminal status and insert its response atomically
    async fn complete_execution(
        &self,
        execution: &Execution,
        response: &ExecutionResponse,
    ) -> RepositoryResult<()>;

    async fn find_execution(&self, id: Uuid) -> RepositoryResult<Option<Execution>>;

    async fn find_response(&self, execution_id: Uuid)
    -> RepositoryResult<Option<ExecutionResponse>>;

    /// Most recent executions of one integration, newest first
    async fn find_by_integration(
        &self,
        integration_id: Uuid,
        limit: u64,
    ) -> RepositoryResult<Vec<ExecutionRecord>>;
}
