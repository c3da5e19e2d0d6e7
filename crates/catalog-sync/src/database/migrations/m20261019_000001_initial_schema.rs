use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_integrations_table(manager).await?;
        self.create_executions_table(manager).await?;
        self.create_execution_responses_table(manager).await?;

        self.create_indexes(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExecutionResponses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Executions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Integrations::Table).to_owned())
            .await?;

        Ok(())
    }
}

impl Migration {
    fn create_id_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.uuid().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    fn create_timestamp_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.timestamp_with_time_zone().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    fn create_nullable_timestamp_column(
        &self,
        manager: &SchemaManager,
        column: impl IntoIden,
    ) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.timestamp_with_time_zone(),
            _ => col.string(),
        };
        col
    }

    async fn create_integrations_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Integrations::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Integrations::Id).primary_key())
                    .col(ColumnDef::new(Integrations::Name).string().not_null())
                    .col(ColumnDef::new(Integrations::Description).string())
                    .col(
                        ColumnDef::new(Integrations::CronExpression)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Integrations::TargetUrl).string().not_null())
                    .col(ColumnDef::new(Integrations::TokenUrl).string().not_null())
                    .col(ColumnDef::new(Integrations::ClientId).string().not_null())
                    .col(
                        ColumnDef::new(Integrations::ClientSecret)
                            .string()
                            .not_null(),
                    )
                    .col(self.create_timestamp_column(manager, Integrations::CreatedAt))
                    .col(self.create_timestamp_column(manager, Integrations::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn create_executions_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Executions::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Executions::Id).primary_key())
                    .col(self.create_id_column(manager, Executions::IntegrationId))
                    .col(
                        ColumnDef::new(Executions::Manual)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Executions::Status).string().not_null())
                    .col(ColumnDef::new(Executions::Description).string())
                    .col(self.create_timestamp_column(manager, Executions::StartedAt))
                    .col(self.create_nullable_timestamp_column(manager, Executions::FinishedAt))
                    .col(ColumnDef::new(Executions::RequestBody).text())
                    .col(ColumnDef::new(Executions::InitiatedBy).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_executions_integration_id")
                            .from(Executions::Table, Executions::IntegrationId)
                            .to(Integrations::Table, Integrations::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_execution_responses_table(
        &self,
        manager: &SchemaManager<'_>,
    ) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExecutionResponses::Table)
                    .if_not_exists()
                    .col(
                        self.create_id_column(manager, ExecutionResponses::ExecutionId)
                            .primary_key(),
                    )
                    .col(self.create_timestamp_column(manager, ExecutionResponses::RespondedAt))
                    .col(
                        ColumnDef::new(ExecutionResponses::StatusCode)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExecutionResponses::Body).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_execution_responses_execution_id")
                            .from(ExecutionResponses::Table, ExecutionResponses::ExecutionId)
                            .to(Executions::Table, Executions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_integrations_cron_expression")
                    .table(Integrations::Table)
                    .col(Integrations::CronExpression)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_executions_integration_started")
                    .table(Executions::Table)
                    .col(Executions::IntegrationId)
                    .col(Executions::StartedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_executions_status")
                    .table(Executions::Table)
                    .col(Executions::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Integrations {
    Table,
    Id,
    Name,
    Description,
    CronExpression,
    TargetUrl,
    TokenUrl,
    ClientId,
    ClientSecret,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Executions {
    Table,
    Id,
    IntegrationId,
    Manual,
    Status,
    Description,
    StartedAt,
    FinishedAt,
    RequestBody,
    InitiatedBy,
}

#[derive(DeriveIden)]
enum ExecutionResponses {
    Table,
    ExecutionId,
    RespondedAt,
    StatusCode,
    Body,
}
