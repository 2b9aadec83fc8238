//! Failure isolation tests
//!
//! These tests verify that:
//! - Timeouts are bounded and classified as down
//! - TLS failures are absorbed like any other transport failure
//! - A persistence failure for one target never affects its siblings

use std::sync::Arc;
use std::time::{Duration, Instant};

use appwatch::probe::HealthStatus;
use appwatch::storage::{StorageBackend, memory::MemoryBackend};
use pretty_assertions::assert_eq;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::*;

#[tokio::test]
async fn test_timeout_records_down_within_bound() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&mock_server)
        .await;

    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let target = register_target(storage.as_ref(), "sloth", &mock_server.uri()).await;

    let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(1));

    let start = Instant::now();
    let summary = scheduler.tick_now().await.unwrap();
    let elapsed = start.elapsed();

    // The tick waits no longer than the probe timeout (plus slack)
    assert!(
        elapsed < Duration::from_secs(3),
        "tick took {elapsed:?}, expected to be bounded by the 1s timeout"
    );
    assert_eq!(summary.recorded, 1);

    let records = storage.latest_health_records(target.id, 10).await.unwrap();
    assert_eq!(records[0].status, HealthStatus::Down);
    assert_eq!(records[0].latency, None);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_tls_failure_records_down() {
    // Speaking TLS to a plain HTTP listener fails the handshake
    let mock_server = MockServer::start().await;
    let https_url = mock_server.uri().replace("http://", "https://");

    let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let target = register_target(storage.as_ref(), "badtls", &https_url).await;

    let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(2));
    let summary = scheduler.tick_now().await.unwrap();

    assert_eq!(summary.recorded, 1);

    let records = storage.latest_health_records(target.id, 10).await.unwrap();
    assert_eq!(records[0].status, HealthStatus::Down);
    assert_eq!(records[0].latency, None);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_persistence_failure_does_not_block_siblings() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    // First inserted target gets id 1; appends for it will fail
    let storage = Arc::new(FailingAppendBackend::new(1));
    let cursed = register_target(storage.as_ref(), "cursed", &mock_server.uri()).await;
    let sibling = register_target(storage.as_ref(), "sibling", &mock_server.uri()).await;
    assert_eq!(cursed.id, 1);

    let scheduler = spawn_manual_scheduler(storage.clone(), Duration::from_secs(10));
    let summary = scheduler.tick_now().await.unwrap();

    // Both targets were probed; only the sibling's record persisted
    assert_eq!(summary.targets, 2);
    assert_eq!(summary.recorded, 1);

    assert!(
        storage
            .latest_health_records(cursed.id, 10)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        storage
            .latest_health_records(sibling.id, 10)
            .await
            .unwrap()
            .len(),
        1
    );

    scheduler.shutdown().await;
}
