use anyhow::Result;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::errors::{AppError, AppResult};

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

/// Cron scheduler behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Feature flag for automatic sends; when false `refresh()` installs nothing
    #[serde(default = "default_auto_send_enabled")]
    pub auto_send_enabled: bool,
}

/// Upstream paginated catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    #[serde(default = "default_page_param")]
    pub page_param: String,
    #[serde(default = "default_size_param")]
    pub size_param: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Field holding the item array; `None` when the page body is the array itself
    #[serde(default = "default_items_field")]
    pub items_field: Option<String>,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(
        default = "default_source_request_timeout",
        with = "duration_serde::duration"
    )]
    pub request_timeout: Duration,
}

/// Outbound delivery behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
    #[serde(
        default = "default_delivery_request_timeout",
        with = "duration_serde::duration"
    )]
    pub request_timeout: Duration,
    /// Bound of the per-job item queue between fetch and send
    #[serde(default = "default_item_queue_capacity")]
    pub item_queue_capacity: usize,
    /// Status recorded when a delivery call fails without a response
    #[serde(default = "default_error_status_code")]
    pub error_status_code: u16,
    /// Bearer token used for targets that have no token URL
    pub static_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
}

fn default_auto_send_enabled() -> bool {
    DEFAULT_AUTO_SEND_ENABLED
}
fn default_page_param() -> String {
    DEFAULT_PAGE_PARAM.to_string()
}
fn default_size_param() -> String {
    DEFAULT_SIZE_PARAM.to_string()
}
fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}
fn default_items_field() -> Option<String> {
    Some(DEFAULT_ITEMS_FIELD.to_string())
}
fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_string()
}
fn default_source_request_timeout() -> Duration {
    parse_default_duration(DEFAULT_SOURCE_REQUEST_TIMEOUT)
}
fn default_connect_timeout() -> Duration {
    parse_default_duration(DEFAULT_CONNECT_TIMEOUT)
}
fn default_delivery_request_timeout() -> Duration {
    parse_default_duration(DEFAULT_DELIVERY_REQUEST_TIMEOUT)
}
fn default_item_queue_capacity() -> usize {
    DEFAULT_ITEM_QUEUE_CAPACITY
}
fn default_error_status_code() -> u16 {
    DEFAULT_ERROR_STATUS_CODE
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn parse_default_duration(value: &str) -> Duration {
    humantime::parse_duration(value).unwrap_or(Duration::from_secs(30))
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: Some(DEFAULT_MAX_CONNECTIONS),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            auto_send_enabled: default_auto_send_enabled(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
            page_param: default_page_param(),
            size_param: default_size_param(),
            page_size: default_page_size(),
            items_field: default_items_field(),
            id_field: default_id_field(),
            request_timeout: default_source_request_timeout(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_delivery_request_timeout(),
            item_queue_capacity: default_item_queue_capacity(),
            error_status_code: default_error_status_code(),
            static_token: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    /// Layer built-in defaults, the TOML file and `CATALOG_SYNC_*` environment variables
    ///
    /// A default file is written when `config_file` does not exist yet.
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if !Path::new(config_file).exists() {
            let contents = toml::to_string_pretty(&Self::default())?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
        }

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed("CATALOG_SYNC_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(AppError::configuration("database.url must not be empty"));
        }
        if self.source.page_size == 0 {
            return Err(AppError::configuration("source.page_size must be greater than zero"));
        }
        if let Err(e) = url::Url::parse(&self.source.base_url) {
            return Err(AppError::configuration(format!(
                "source.base_url '{}' is not a valid URL: {}",
                self.source.base_url, e
            )));
        }
        if self.source.id_field.trim().is_empty() {
            return Err(AppError::configuration("source.id_field must not be empty"));
        }
        if self.delivery.item_queue_capacity == 0 {
            return Err(AppError::configuration("delivery.item_queue_capacity must be greater than zero"));
        }
        if !(100..=599).contains(&self.delivery.error_status_code) {
            return Err(AppError::configuration(format!(
                "delivery.error_status_code {} is not an HTTP status",
                self.delivery.error_status_code
            )));
        }

        Ok(())
    }
}
