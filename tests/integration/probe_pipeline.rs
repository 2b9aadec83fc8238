//! Integration tests for the probe-classify-record pipeline
//!
//! These tests verify that:
//! - Healthy responses produce up records with latency
//! - Error statuses and transport failures produce down records
//! - Every target in the snapshot gets exactly one record per tick
//! - Registry changes only take effect on the next tick

use std::sync::Arc;
use std::time::Duration;

use appwatch::probe::HealthStatus;
use appwatch::storage::{StorageBackend, memory::MemoryBackend};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::*;

#[tokio::test]
async fn test_healthy_response_records_up_with_latency() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(120)))
        .mount(&mock_server)
        .await;

    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let target = register_target(storage.as_ref(), "shop", &mock_server.uri()).await;

    let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(10));
    let summary = scheduler.tick_now().await.unwrap();

    assert_eq!(summary.targets, 1);
    assert_eq!(summary.recorded, 1);

    let records = storage.latest_health_records(target.id, 10).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, HealthStatus::Up);

    let latency = records[0].latency.unwrap();
    assert!(latency >= 0.12, "latency {latency} below response delay");
    assert!(latency < 5.0);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_created_status_records_up() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&mock_server)
        .await;

    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let target = register_target(storage.as_ref(), "api", &mock_server.uri()).await;

    let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(10));
    scheduler.tick_now().await.unwrap();

    let records = storage.latest_health_records(target.id, 10).await.unwrap();
    assert_eq!(records[0].status, HealthStatus::Up);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_server_error_records_down_without_latency() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let target = register_target(storage.as_ref(), "broken", &mock_server.uri()).await;

    let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(10));
    let summary = scheduler.tick_now().await.unwrap();

    // A failed probe still produces a record, never a skip
    assert_eq!(summary.recorded, 1);

    let records = storage.latest_health_records(target.id, 10).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, HealthStatus::Down);
    assert_eq!(records[0].latency, None);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_redirect_records_down() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/elsewhere"))
        .mount(&mock_server)
        .await;

    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let target = register_target(storage.as_ref(), "mover", &mock_server.uri()).await;

    let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(10));
    scheduler.tick_now().await.unwrap();

    let records = storage.latest_health_records(target.id, 10).await.unwrap();
    assert_eq!(records[0].status, HealthStatus::Down);
    assert_eq!(records[0].latency, None);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_target_records_down() {
    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    // Reserved TLD, guaranteed not to resolve
    let target = register_target(storage.as_ref(), "ghost", "http://appwatch.invalid/").await;

    let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(2));
    let summary = scheduler.tick_now().await.unwrap();

    assert_eq!(summary.recorded, 1);

    let records = storage.latest_health_records(target.id, 10).await.unwrap();
    assert_eq!(records[0].status, HealthStatus::Down);
    assert_eq!(records[0].latency, None);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_one_record_per_target_per_tick() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let up = register_target(storage.as_ref(), "up", &format!("{}/ok", mock_server.uri())).await;
    let down = register_target(storage.as_ref(), "down", &format!("{}/bad", mock_server.uri())).await;

    let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(10));

    let summary = scheduler.tick_now().await.unwrap();
    assert_eq!(summary.targets, 2);
    assert_eq!(summary.recorded, 2);

    for target_id in [up.id, down.id] {
        let records = storage.latest_health_records(target_id, 10).await.unwrap();
        assert_eq!(records.len(), 1, "target {target_id} should have 1 record");
    }

    scheduler.tick_now().await.unwrap();

    for target_id in [up.id, down.id] {
        let records = storage.latest_health_records(target_id, 10).await.unwrap();
        assert_eq!(records.len(), 2, "target {target_id} should have 2 records");
    }

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_target_added_after_tick_waits_for_next_tick() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let first = register_target(storage.as_ref(), "first", &mock_server.uri()).await;

    let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(10));
    scheduler.tick_now().await.unwrap();

    // Registered between ticks - must not appear in the completed tick
    let second = register_target(storage.as_ref(), "second", &mock_server.uri()).await;

    assert_eq!(
        storage.latest_health_records(first.id, 10).await.unwrap().len(),
        1
    );
    assert!(
        storage
            .latest_health_records(second.id, 10)
            .await
            .unwrap()
            .is_empty()
    );

    scheduler.tick_now().await.unwrap();

    assert_eq!(
        storage.latest_health_records(second.id, 10).await.unwrap().len(),
        1
    );

    scheduler.shutdown().await;
}
