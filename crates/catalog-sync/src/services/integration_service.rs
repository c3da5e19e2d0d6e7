//! Integration definition service
//!
//! Validates definitions at write time (cron syntax, target URLs,
//! credentials), persists them through the catalog and then refreshes the
//! cron schedule so the change takes effect without a restart.

use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::database::repositories::IntegrationCatalog;
use crate::errors::{AppError, AppResult, RepositoryError};
use crate::job_scheduling::ScheduleManager;
use crate::models::{DeliveryTarget, Integration, IntegrationCreateRequest, IntegrationUpdateRequest};
use crate::utils::cron_helper;
use crate::utils::url::UrlUtils;

pub struct IntegrationService {
    catalog: Arc<dyn IntegrationCatalog>,
    schedule_manager: Option<Arc<ScheduleManager>>,
}

impl IntegrationService {
    pub fn new(catalog: Arc<dyn IntegrationCatalog>) -> Self {
        Self {
            catalog,
            schedule_manager: None,
        }
    }

    pub fn with_schedule_manager(mut self, schedule_manager: Arc<ScheduleManager>) -> Self {
        self.schedule_manager = Some(schedule_manager);
        self
    }

    pub async fn create(&self, request: IntegrationCreateRequest) -> AppResult<Integration> {
        Self::validate(&request.name, &request.cron_expression, &request.target)?;
        info!("Creating integration: {}", request.name);

        let integration = self.catalog.create(request).await?;
        self.refresh_schedule().await;

        info!(
            "Created integration: {} ({})",
            integration.name, integration.id
        );
        Ok(integration)
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: IntegrationUpdateRequest,
    ) -> AppResult<Integration> {
        Self::validate(&request.name, &request.cron_expression, &request.target)?;
        info!("Updating integration: {}", id);

        let integration = self
            .catalog
            .update(id, request)
            .await
            .map_err(|e| Self::map_not_found(e, id))?;
        self.refresh_schedule().await;

        Ok(integration)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        info!("Deleting integration: {}", id);

        self.catalog
            .delete(id)
            .await
            .map_err(|e| Self::map_not_found(e, id))?;
        self.refresh_schedule().await;

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Integration> {
        self.catalog
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("integration", id))
    }

    pub async fn list(&self) -> AppResult<Vec<Integration>> {
        Ok(self.catalog.load_all().await?)
    }

    /// Write-time checks; the scheduler trusts every stored definition
    pub fn validate(name: &str, cron_expression: &str, target: &DeliveryTarget) -> AppResult<()> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Integration name must not be empty"));
        }

        cron_helper::parse_schedule(cron_expression).map_err(AppError::validation)?;

        UrlUtils::parse_http_url(&target.url)
            .map_err(|e| AppError::validation(format!("Invalid target URL: {e}")))?;

        if !target.token_url.trim().is_empty() {
            UrlUtils::parse_http_url(&target.token_url)
                .map_err(|e| AppError::validation(format!("Invalid token URL: {e}")))?;
            if target.client_id.trim().is_empty() || target.client_secret.is_empty() {
                return Err(AppError::validation(
                    "Client id and secret are required when a token URL is set",
                ));
            }
        }

        Ok(())
    }

    async fn refresh_schedule(&self) {
        if let Some(manager) = &self.schedule_manager
            && let Err(e) = manager.refresh().await
        {
            // The write itself is committed; the next successful refresh picks it up
            error!("Failed to refresh cron schedule after catalog change: {}", e);
        }
    }

    fn map_not_found(error: RepositoryError, id: Uuid) -> AppError {
        match error {
            RepositoryError::RecordNotFound { .. } => AppError::not_found("integration", id),
            other => other.into(),
        }
    }
}
