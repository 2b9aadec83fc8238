//! Test helpers shared across integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use appwatch::probe::HealthStatus;
use appwatch::scheduler::SchedulerHandle;
use appwatch::storage::{
    HealthRecordRow, NewTarget, StorageBackend, StorageError, StorageResult, TagRow, TargetFilter,
    TargetRow, TargetSnapshot, memory::MemoryBackend,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Interval long enough that only explicit TickNow commands fire ticks
pub const MANUAL_INTERVAL: Duration = Duration::from_secs(3600);

/// Spawn a scheduler that only ticks on demand
pub fn spawn_manual_scheduler(
    storage: Arc<dyn StorageBackend>,
    timeout: Duration,
) -> SchedulerHandle {
    SchedulerHandle::spawn(storage, MANUAL_INTERVAL, timeout, None).unwrap()
}

/// Register a target pointing at `url`
pub async fn register_target(storage: &dyn StorageBackend, name: &str, url: &str) -> TargetRow {
    storage
        .insert_target(NewTarget {
            name: name.to_string(),
            url: url.to_string(),
            is_production: false,
            tags: vec![],
        })
        .await
        .unwrap()
}

/// Storage wrapper whose `append_health_record` fails for one target
///
/// Used to verify that a persistence failure for a single target does
/// not prevent sibling records in the same tick.
pub struct FailingAppendBackend {
    inner: MemoryBackend,
    fail_for: i64,
}

impl FailingAppendBackend {
    pub fn new(fail_for: i64) -> Self {
        Self {
            inner: MemoryBackend::new(),
            fail_for,
        }
    }
}

#[async_trait]
impl StorageBackend for FailingAppendBackend {
    async fn insert_target(&self, target: NewTarget) -> StorageResult<TargetRow> {
        self.inner.insert_target(target).await
    }

    async fn get_target(&self, id: i64) -> StorageResult<Option<TargetRow>> {
        self.inner.get_target(id).await
    }

    async fn get_target_by_name(&self, name: &str) -> StorageResult<Option<TargetRow>> {
        self.inner.get_target_by_name(name).await
    }

    async fn list_targets(&self, filter: TargetFilter) -> StorageResult<Vec<TargetRow>> {
        self.inner.list_targets(filter).await
    }

    async fn update_target(&self, id: i64, target: NewTarget) -> StorageResult<Option<TargetRow>> {
        self.inner.update_target(id, target).await
    }

    async fn delete_target(&self, id: i64) -> StorageResult<Option<TargetRow>> {
        self.inner.delete_target(id).await
    }

    async fn insert_tag(&self, name: &str) -> StorageResult<TagRow> {
        self.inner.insert_tag(name).await
    }

    async fn get_tag_by_name(&self, name: &str) -> StorageResult<Option<TagRow>> {
        self.inner.get_tag_by_name(name).await
    }

    async fn list_tags(&self) -> StorageResult<Vec<TagRow>> {
        self.inner.list_tags().await
    }

    async fn delete_tag(&self, id: i64) -> StorageResult<Option<TagRow>> {
        self.inner.delete_tag(id).await
    }

    async fn current_targets(&self) -> StorageResult<Vec<TargetSnapshot>> {
        self.inner.current_targets().await
    }

    async fn append_health_record(
        &self,
        target_id: i64,
        status: HealthStatus,
        latency: Option<f64>,
        observed_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        if target_id == self.fail_for {
            return Err(StorageError::QueryFailed(
                "simulated insert failure".to_string(),
            ));
        }
        self.inner
            .append_health_record(target_id, status, latency, observed_at)
            .await
    }

    async fn latest_health_records(
        &self,
        target_id: i64,
        limit: usize,
    ) -> StorageResult<Vec<HealthRecordRow>> {
        self.inner.latest_health_records(target_id, limit).await
    }

    async fn ping(&self) -> StorageResult<()> {
        self.inner.ping().await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}
