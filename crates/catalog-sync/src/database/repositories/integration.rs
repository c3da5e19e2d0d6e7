//! SeaORM Integration repository implementation

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set};
use std::sync::Arc;
use uuid::Uuid;

use super::traits::IntegrationCatalog;
use crate::entities::{integrations, prelude::*};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{
    DeliveryTarget, Integration, IntegrationCreateRequest, IntegrationUpdateRequest,
};

/// SeaORM-based Integration repository
#[derive(Clone)]
pub struct IntegrationSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl IntegrationSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    fn model_to_domain(model: integrations::Model) -> Integration {
        Integration {
            id: model.id,
            name: model.name,
            description: model.description,
            cron_expression: model.cron_expression,
            target: DeliveryTarget {
                url: model.target_url,
                token_url: model.token_url,
                client_id: model.client_id,
                client_secret: model.client_secret,
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait]
impl IntegrationCatalog for IntegrationSeaOrmRepository {
    async fn load_all(&self) -> RepositoryResult<Vec<Integration>> {
        let models = Integrations::find()
            .order_by_asc(integrations::Column::CreatedAt)
            .all(&*self.connection)
            .await?;

        Ok(models.into_iter().map(Self::model_to_domain).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Integration>> {
        let model = Integrations::find_by_id(id).one(&*self.connection).await?;
        Ok(model.map(Self::model_to_domain))
    }

    async fn create(&self, request: IntegrationCreateRequest) -> RepositoryResult<Integration> {
        let now = chrono::Utc::now();

        let active_model = integrations::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            description: Set(request.description),
            cron_expression: Set(request.cron_expression),
            target_url: Set(request.target.url),
            token_url: Set(request.target.token_url),
            client_id: Set(request.target.client_id),
            client_secret: Set(request.target.client_secret),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&*self.connection).await?;
        Ok(Self::model_to_domain(model))
    }

    async fn update(
        &self,
        id: Uuid,
        request: IntegrationUpdateRequest,
    ) -> RepositoryResult<Integration> {
        let model = Integrations::find_by_id(id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| RepositoryError::not_found("integrations", "id", id))?;

        let mut active_model: integrations::ActiveModel = model.into();
        active_model.name = Set(request.name);
        active_model.description = Set(request.description);
        active_model.cron_expression = Set(request.cron_expression);
        active_model.target_url = Set(request.target.url);
        active_model.token_url = Set(request.target.token_url);
        active_model.client_id = Set(request.target.client_id);
        active_model.client_secret = Set(request.target.client_secret);
        active_model.updated_at = Set(chrono::Utc::now());

        let updated_model = active_model.update(&*self.connection).await?;
        Ok(Self::model_to_domain(updated_model))
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let model = Integrations::find_by_id(id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| RepositoryError::not_found("integrations", "id", id))?;

        model.delete(&*self.connection).await?;
        Ok(())
    }
}
