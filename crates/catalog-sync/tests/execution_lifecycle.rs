//! Execution lifecycle against the SeaORM store
//!
//! Drives the three bookkeeping steps through `ExecutionService` on an
//! in-memory SQLite database and checks what ends up persisted.

mod common;

use serde_json::json;
use std::sync::Arc;

use catalog_sync::{
    database::repositories::{
        ExecutionSeaOrmRepository, ExecutionStore, IntegrationCatalog, IntegrationSeaOrmRepository,
    },
    errors::AppError,
    models::{ExecutionStatus, ExecutionTrigger, Integration, QueueItem},
    services::ExecutionService,
};
use common::{create_request, create_test_database};

async fn setup() -> (ExecutionService, Arc<ExecutionSeaOrmRepository>, Integration) {
    let database = create_test_database().await;
    let catalog = IntegrationSeaOrmRepository::new(database.connection());
    let integration = catalog
        .create(create_request("shop", "0 0 * * * *"))
        .await
        .unwrap();

    let store = Arc::new(ExecutionSeaOrmRepository::new(database.connection()));
    (ExecutionService::new(store.clone()), store, integration)
}

#[tokio::test]
async fn test_success_response_round_trip() {
    let (service, _store, integration) = setup().await;
    let item = QueueItem::new("sku-1", 1, json!({ "id": "sku-1", "price": 12.5 }));

    let mut execution = service
        .init_execution(&integration, &ExecutionTrigger::Automatic, Some("Deliver item sku-1".to_string()))
        .await
        .unwrap();
    assert_eq!(execution.status, ExecutionStatus::Started);

    let body = service
        .add_request_to_execution(&mut execution, &item)
        .await
        .unwrap();
    assert_eq!(execution.status, ExecutionStatus::Pending);

    let status = service
        .add_response_to_execution(&mut execution, 200, "{\"ok\":true}".to_string())
        .await
        .unwrap();
    assert_eq!(status, ExecutionStatus::Success);

    let record = service.get(execution.id).await.unwrap();
    assert_eq!(record.execution.status, ExecutionStatus::Success);
    assert_eq!(record.execution.request_body.as_deref(), Some(body.as_str()));
    assert!(record.execution.finished_at.is_some());
    assert!(!record.execution.manual);

    let response = record.response.unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "{\"ok\":true}");
}

#[tokio::test]
async fn test_error_response_round_trip() {
    let (service, _store, integration) = setup().await;
    let trigger = ExecutionTrigger::Manual {
        user_id: "user-42".to_string(),
    };
    let item = QueueItem::new("sku-2", 1, json!({ "id": "sku-2" }));

    let mut execution = service.init_execution(&integration, &trigger, None).await.unwrap();
    service
        .add_request_to_execution(&mut execution, &item)
        .await
        .unwrap();
    let status = service
        .add_response_to_execution(&mut execution, 500, "upstream exploded".to_string())
        .await
        .unwrap();
    assert_eq!(status, ExecutionStatus::Error);

    let record = service.get(execution.id).await.unwrap();
    assert_eq!(record.execution.status, ExecutionStatus::Error);
    assert!(record.execution.manual);
    assert_eq!(record.execution.initiated_by.as_deref(), Some("user-42"));
    assert_eq!(record.response.unwrap().status_code, 500);
}

#[tokio::test]
async fn test_response_before_request_is_rejected() {
    let (service, store, integration) = setup().await;

    let mut execution = service
        .init_execution(&integration, &ExecutionTrigger::Automatic, None)
        .await
        .unwrap();
    let err = service
        .add_response_to_execution(&mut execution, 200, "ok".to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Lifecycle(_)));
    assert_eq!(execution.status, ExecutionStatus::Started);
    let stored = store.find_execution(execution.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ExecutionStatus::Started);
    assert!(store.find_response(execution.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_terminal_execution_cannot_be_reopened() {
    let (service, _store, integration) = setup().await;
    let item = QueueItem::new("sku-3", 1, json!({ "id": "sku-3" }));

    let mut execution = service
        .init_execution(&integration, &ExecutionTrigger::Automatic, None)
        .await
        .unwrap();
    service
        .add_request_to_execution(&mut execution, &item)
        .await
        .unwrap();
    service
        .add_response_to_execution(&mut execution, 201, String::new())
        .await
        .unwrap();

    assert!(
        service
            .add_request_to_execution(&mut execution, &item)
            .await
            .is_err()
    );
    assert!(
        service
            .add_response_to_execution(&mut execution, 500, String::new())
            .await
            .is_err()
    );
    assert_eq!(
        service.get(execution.id).await.unwrap().execution.status,
        ExecutionStatus::Success
    );
}

#[tokio::test]
async fn test_history_is_newest_first_and_limited() {
    let (service, _store, integration) = setup().await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let execution = service
            .init_execution(&integration, &ExecutionTrigger::Automatic, None)
            .await
            .unwrap();
        ids.push(execution.id);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let history = service.history(integration.id, 2).await.unwrap();
    let listed: Vec<_> = history.iter().map(|r| r.execution.id).collect();
    assert_eq!(listed, vec![ids[2], ids[1]]);
    assert!(history.iter().all(|r| r.response.is_none()));
}

#[tokio::test]
async fn test_unknown_execution_is_not_found() {
    let (service, _store, _integration) = setup().await;
    let err = service.get(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}
