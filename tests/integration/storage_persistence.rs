//! End-to-end persistence tests with the SQLite backend
//!
//! These tests run the real pipeline (scheduler → probe → classify →
//! record) against a SQLite file and verify the history survives a
//! backend reopen.

use std::sync::Arc;
use std::time::Duration;

use appwatch::probe::HealthStatus;
use appwatch::storage::{StorageBackend, sqlite::SqliteBackend};
use pretty_assertions::assert_eq;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::*;

#[tokio::test]
async fn test_pipeline_records_to_sqlite() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("pipeline.db");

    let storage: Arc<dyn StorageBackend> =
        Arc::new(SqliteBackend::new(&db_path).await.unwrap());
    let target = register_target(storage.as_ref(), "shop", &mock_server.uri()).await;

    let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(10));
    for _ in 0..3 {
        scheduler.tick_now().await.unwrap();
    }
    scheduler.shutdown().await;

    let records = storage.latest_health_records(target.id, 20).await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.status == HealthStatus::Up));
    assert!(records.iter().all(|r| r.latency.is_some()));

    storage.close().await.unwrap();
}

#[tokio::test]
async fn test_history_survives_reopen() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("reopen.db");

    let target_id = {
        let storage: Arc<dyn StorageBackend> =
            Arc::new(SqliteBackend::new(&db_path).await.unwrap());
        let target = register_target(storage.as_ref(), "flaky", &mock_server.uri()).await;

        let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(10));
        scheduler.tick_now().await.unwrap();
        scheduler.shutdown().await;

        storage.close().await.unwrap();
        target.id
    };

    let reopened = SqliteBackend::new(&db_path).await.unwrap();

    let target = reopened.get_target(target_id).await.unwrap().unwrap();
    assert_eq!(target.name, "flaky");

    let records = reopened.latest_health_records(target_id, 20).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, HealthStatus::Down);
    assert_eq!(records[0].latency, None);
}
