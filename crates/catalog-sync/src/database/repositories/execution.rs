//! SeaORM Execution repository implementation
//!
//! Status changes are written as conditional updates keyed on the previous
//! status, so a transition the stored row has already moved past matches no
//! row and surfaces as [`RepositoryError::ConcurrentModification`].

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::traits::ExecutionStore;
use crate::entities::{execution_responses, executions, prelude::*};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{Execution, ExecutionRecord, ExecutionResponse, ExecutionStatus};

/// SeaORM-based Execution repository
#[derive(Clone)]
pub struct ExecutionSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl ExecutionSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    async fn compare_and_set<C: ConnectionTrait>(
        db: &C,
        execution: &Execution,
        from: ExecutionStatus,
    ) -> RepositoryResult<()> {
        let result = Executions::update_many()
            .col_expr(
                executions::Column::Status,
                Expr::value(execution.status.to_string()),
            )
            .col_expr(
                executions::Column::RequestBody,
                Expr::value(execution.request_body.clone()),
            )
            .col_expr(
                executions::Column::FinishedAt,
                Expr::value(execution.finished_at),
            )
            .filter(executions::Column::Id.eq(execution.id))
            .filter(executions::Column::Status.eq(from.to_string()))
            .exec(db)
            .await?;

        if result.rows_affected != 1 {
            return Err(RepositoryError::ConcurrentModification {
                table: "executions".to_string(),
                id: execution.id.to_string(),
                expected: from.to_string(),
            });
        }

        Ok(())
    }

    fn model_to_domain(model: executions::Model) -> RepositoryResult<Execution> {
        let status = ExecutionStatus::from_str(&model.status).map_err(|_| {
            RepositoryError::InvalidStoredValue {
                column: "executions.status".to_string(),
                value: model.status.clone(),
            }
        })?;

        Ok(Execution {
            id: model.id,
            integration_id: model.integration_id,
            manual: model.manual,
            status,
            description: model.description,
            started_at: model.started_at,
            finished_at: model.finished_at,
            request_body: model.request_body,
            initiated_by: model.initiated_by,
        })
    }

    fn response_to_domain(model: execution_responses::Model) -> RepositoryResult<ExecutionResponse> {
        let status_code =
            u16::try_from(model.status_code).map_err(|_| RepositoryError::InvalidStoredValue {
                column: "execution_responses.status_code".to_string(),
                value: model.status_code.to_string(),
            })?;

        Ok(ExecutionResponse {
            execution_id: model.execution_id,
            responded_at: model.responded_at,
            status_code,
            body: model.body,
        })
    }
}

#[async_trait]
impl ExecutionStore for ExecutionSeaOrmRepository {
    async fn create_execution(&self, execution: &Execution) -> RepositoryResult<()> {
        let active_model = executions::ActiveModel {
            id: Set(execution.id),
            integration_id: Set(execution.integration_id),
            manual: Set(execution.manual),
            status: Set(execution.status.to_string()),
            description: Set(execution.description.clone()),
            started_at: Set(execution.started_at),
            finished_at: Set(execution.finished_at),
            request_body: Set(execution.request_body.clone()),
            initiated_by: Set(execution.initiated_by.clone()),
        };

        active_model.insert(&*self.connection).await?;
        Ok(())
    }

    async fn transition_execution(
        &self,
        execution: &Execution,
        from: ExecutionStatus,
    ) -> RepositoryResult<()> {
        Self::compare_and_set(&*self.connection, execution, from).await
    }

    async fn complete_execution(
        &self,
        execution: &Execution,
        response: &ExecutionResponse,
    ) -> RepositoryResult<()> {
        let txn = self.connection.begin().await?;

        Self::compare_and_set(&txn, execution, ExecutionStatus::Pending).await?;

        let active_model = execution_responses::ActiveModel {
            execution_id: Set(response.execution_id),
            responded_at: Set(response.responded_at),
            status_code: Set(i32::from(response.status_code)),
            body: Set(response.body.clone()),
        };
        active_model.insert(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn find_execution(&self, id: Uuid) -> RepositoryResult<Option<Execution>> {
        Executions::find_by_id(id)
            .one(&*self.connection)
            .await?
            .map(Self::model_to_domain)
            .transpose()
    }

    async fn find_response(
        &self,
        execution_id: Uuid,
    ) -> RepositoryResult<Option<ExecutionResponse>> {
        ExecutionResponses::find_by_id(execution_id)
            .one(&*self.connection)
            .await?
            .map(Self::response_to_domain)
            .transpose()
    }

    async fn find_by_integration(
        &self,
        integration_id: Uuid,
        limit: u64,
    ) -> RepositoryResult<Vec<ExecutionRecord>> {
        let rows = Executions::find()
            .filter(executions::Column::IntegrationId.eq(integration_id))
            .order_by_desc(executions::Column::StartedAt)
            .limit(limit)
            .find_also_related(ExecutionResponses)
            .all(&*self.connection)
            .await?;

        rows.into_iter()
            .map(|(execution, response)| {
                Ok(ExecutionRecord {
                    execution: Self::model_to_domain(execution)?,
                    response: response.map(Self::response_to_domain).transpose()?,
                })
            })
            .collect()
    }
}
