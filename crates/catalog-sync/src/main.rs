use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_sync::{
    config::Config,
    database::{
        Database,
        repositories::{ExecutionSeaOrmRepository, IntegrationCatalog, IntegrationSeaOrmRepository},
    },
    ingestor::{IntegrationJobExecutor, ItemQueueRegistry},
    job_scheduling::{JobSchedulingApi, PriorityTaskQueue, RefreshOutcome, ScheduleManager, TaskDispatcher},
    services::{ClientCredentialsAuthProvider, ExecutionService, HttpPutSendStrategy, IntegrationService},
    sources::CatalogApiSource,
    utils::HttpClientFactory,
};

#[derive(Parser)]
#[command(name = "catalog-sync")]
#[command(version)]
#[command(about = "Scheduled catalog synchronization with tracked delivery executions")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path (defaults to $CONFIG_FILE or config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level (overrides config file)
    #[arg(short = 'v', long)]
    log_level: Option<String>,

    /// Do not install cron triggers; only manual syncs run
    #[arg(long)]
    no_auto_send: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };

    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }
    if let Some(log_level) = cli.log_level {
        config.logging.level = log_level;
    }
    if cli.no_auto_send {
        config.scheduler.auto_send_enabled = false;
    }

    init_tracing(&config);

    info!("Starting catalog-sync v{}", env!("CARGO_PKG_VERSION"));

    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    info!("Database connection established and migrations applied");

    let http_client = HttpClientFactory::from_config(&config.delivery).create_client()?;

    let catalog: Arc<dyn IntegrationCatalog> =
        Arc::new(IntegrationSeaOrmRepository::new(database.connection()));
    let execution_service =
        ExecutionService::new(Arc::new(ExecutionSeaOrmRepository::new(database.connection())));

    let source = Arc::new(CatalogApiSource::new(http_client.clone(), config.source.clone())?);
    let auth = Arc::new(ClientCredentialsAuthProvider::new(
        http_client.clone(),
        config.delivery.static_token.clone(),
    ));
    let sender = Arc::new(HttpPutSendStrategy::new(http_client));
    let item_queues = Arc::new(ItemQueueRegistry::new());

    let executor = Arc::new(IntegrationJobExecutor::new(
        source,
        execution_service.clone(),
        auth,
        sender,
        item_queues.clone(),
        &config.delivery,
    ));
    let dispatcher = Arc::new(TaskDispatcher::new(Arc::new(PriorityTaskQueue::new()), executor));
    let schedule_manager = Arc::new(ScheduleManager::new(
        catalog.clone(),
        dispatcher.clone(),
        config.scheduler.auto_send_enabled,
    ));

    let integration_service =
        IntegrationService::new(catalog.clone()).with_schedule_manager(schedule_manager.clone());
    let api = JobSchedulingApi::new(
        dispatcher.clone(),
        schedule_manager.clone(),
        catalog,
        execution_service,
        item_queues,
    );

    let cancellation_token = CancellationToken::new();

    let dispatcher_handle = {
        let dispatcher = dispatcher.clone();
        let token = cancellation_token.clone();
        tokio::spawn(async move { dispatcher.run(token).await })
    };
    let pump_handle = {
        let schedule_manager = schedule_manager.clone();
        let token = cancellation_token.clone();
        tokio::spawn(async move { schedule_manager.run(token).await })
    };

    let integrations = integration_service.list().await?;
    info!("{} integration(s) defined", integrations.len());

    match api.refresh_schedule().await {
        Ok(RefreshOutcome::Disabled) => {
            warn!("Automatic sending is disabled; integrations only run when triggered manually")
        }
        Ok(RefreshOutcome::Installed { triggers, .. }) => {
            for trigger in api.installed_triggers().await {
                info!(
                    "Trigger '{}' covers {} integration(s), next fire {:?}",
                    trigger.expression,
                    trigger.integration_ids.len(),
                    trigger.next_fire
                );
            }
            info!("{} cron trigger(s) active", triggers);
        }
        Err(e) => error!("Initial schedule refresh failed: {}", e),
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, waiting for the running job to finish its current item");
    cancellation_token.cancel();

    if let Err(e) = pump_handle.await? {
        error!("Cron schedule pump failed: {}", e);
    }
    if let Err(e) = dispatcher_handle.await? {
        error!("Task dispatcher failed: {}", e);
    }

    let stats = api.dispatcher_stats().await;
    info!(
        "Stopped: {} job(s) completed, {} failed, {} panicked, {} not started",
        stats.completed, stats.failed, stats.panicked, stats.pending
    );

    Ok(())
}

fn init_tracing(config: &Config) {
    let log_filter = format!("catalog_sync={}", config.logging.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_filter.into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
