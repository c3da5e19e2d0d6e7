//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use catalog_sync::{
    config::DatabaseConfig,
    database::Database,
    errors::{DeliveryError, DeliveryResult, SourceResult},
    models::{DeliveryTarget, IntegrationCreateRequest},
    services::{AuthProvider, DeliveryOutcome, SendStrategy},
    sources::{PageSource, SourceRecord},
};

/// Fresh migrated in-memory SQLite database
pub async fn create_test_database() -> Database {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
    };
    let database = Database::new(&config)
        .await
        .expect("Failed to create test database");
    database.migrate().await.expect("Failed to run migrations");
    database
}

pub fn create_request(name: &str, cron: &str) -> IntegrationCreateRequest {
    IntegrationCreateRequest {
        name: name.to_string(),
        description: Some(format!("{name} catalog feed")),
        cron_expression: cron.to_string(),
        target: DeliveryTarget {
            url: format!("https://{name}.example.com/api/items"),
            token_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
        },
    }
}

/// Upstream catalog with fixed page sizes; ids are `p{page}-{n}`
pub struct FixedPages(pub Vec<usize>);

#[async_trait]
impl PageSource for FixedPages {
    async fn fetch_page(&self, page: u32) -> SourceResult<Vec<SourceRecord>> {
        let size = self.0.get(page as usize - 1).copied().unwrap_or(0);
        Ok((0..size)
            .map(|n| {
                let id = format!("p{page}-{n}");
                SourceRecord::new(id.clone(), serde_json::json!({ "id": id, "page": page }))
            })
            .collect())
    }
}

pub struct FixedToken;

#[async_trait]
impl AuthProvider for FixedToken {
    async fn obtain_access_token(&self, target: &DeliveryTarget) -> DeliveryResult<String> {
        if target.url.is_empty() {
            return Err(DeliveryError::authentication("no target"));
        }
        Ok("test-token".to_string())
    }
}

/// Answers with a fixed status and remembers every delivered item id
pub struct CapturingSender {
    pub status_code: u16,
    pub delivered: Mutex<Vec<String>>,
}

impl CapturingSender {
    pub fn new(status_code: u16) -> Arc<Self> {
        Arc::new(Self {
            status_code,
            delivered: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SendStrategy for CapturingSender {
    async fn send(
        &self,
        _target: &DeliveryTarget,
        item_id: &str,
        _body: &str,
        access_token: &str,
    ) -> DeliveryResult<DeliveryOutcome> {
        assert_eq!(access_token, "test-token");
        self.delivered.lock().await.push(item_id.to_string());
        Ok(DeliveryOutcome {
            status_code: self.status_code,
            body: "{\"accepted\":true}".to_string(),
        })
    }
}

/// Poll `check` until it holds or two seconds pass
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
