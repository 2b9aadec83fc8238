//! In-memory storage backend (no persistence)
//!
//! Keeps the registry and health history in maps behind an async
//! RwLock. Useful for:
//! - Testing without database dependencies
//! - The `"none"` storage configuration (all data lost on restart)

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::probe::HealthStatus;

use super::backend::StorageBackend;
use super::error::{StorageError, StorageResult};
use super::schema::{HealthRecordRow, NewTarget, TagRow, TargetFilter, TargetRow, TargetSnapshot};

#[derive(Debug, Clone)]
struct StoredTarget {
    name: String,
    url: String,
    is_production: bool,
    tag_ids: Vec<i64>,
}

#[derive(Default)]
struct Inner {
    targets: HashMap<i64, StoredTarget>,
    tags: HashMap<i64, String>,
    records: HashMap<i64, Vec<HealthRecordRow>>,
    next_target_id: i64,
    next_tag_id: i64,
    next_record_id: i64,
}

impl Inner {
    fn tag_ids_for_names(&self, names: &[String]) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .tags
            .iter()
            .filter(|(_, name)| names.contains(name))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn target_row(&self, id: i64, stored: &StoredTarget) -> TargetRow {
        let mut tags: Vec<TagRow> = stored
            .tag_ids
            .iter()
            .filter_map(|tag_id| {
                self.tags.get(tag_id).map(|name| TagRow {
                    id: *tag_id,
                    name: name.clone(),
                })
            })
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        TargetRow {
            id,
            name: stored.name.clone(),
            url: stored.url.clone(),
            is_production: stored.is_production,
            tags,
        }
    }
}

/// In-memory storage backend
pub struct MemoryBackend {
    inner: RwLock<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn insert_target(&self, target: NewTarget) -> StorageResult<TargetRow> {
        let mut inner = self.inner.write().await;

        if inner.targets.values().any(|t| t.name == target.name) {
            return Err(StorageError::Conflict(format!(
                "target name already taken: {}",
                target.name
            )));
        }

        inner.next_target_id += 1;
        let id = inner.next_target_id;

        let tag_ids = inner.tag_ids_for_names(&target.tags);
        let stored = StoredTarget {
            name: target.name,
            url: target.url,
            is_production: target.is_production,
            tag_ids,
        };

        let row = inner.target_row(id, &stored);
        inner.targets.insert(id, stored);

        Ok(row)
    }

    async fn get_target(&self, id: i64) -> StorageResult<Option<TargetRow>> {
        let inner = self.inner.read().await;
        Ok(inner.targets.get(&id).map(|t| inner.target_row(id, t)))
    }

    async fn get_target_by_name(&self, name: &str) -> StorageResult<Option<TargetRow>> {
        let inner = self.inner.read().await;
        Ok(inner
            .targets
            .iter()
            .find(|(_, t)| t.name == name)
            .map(|(id, t)| inner.target_row(*id, t)))
    }

    async fn list_targets(&self, filter: TargetFilter) -> StorageResult<Vec<TargetRow>> {
        let inner = self.inner.read().await;

        let mut ids: Vec<i64> = inner.targets.keys().copied().collect();
        ids.sort_unstable();

        let rows = ids
            .into_iter()
            .filter_map(|id| inner.targets.get(&id).map(|t| inner.target_row(id, t)))
            .filter(|row| {
                filter
                    .is_production
                    .is_none_or(|wanted| row.is_production == wanted)
            })
            .skip(filter.skip)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(rows)
    }

    async fn update_target(&self, id: i64, target: NewTarget) -> StorageResult<Option<TargetRow>> {
        let mut inner = self.inner.write().await;

        if !inner.targets.contains_key(&id) {
            return Ok(None);
        }

        if inner
            .targets
            .iter()
            .any(|(other_id, t)| *other_id != id && t.name == target.name)
        {
            return Err(StorageError::Conflict(format!(
                "target name already taken: {}",
                target.name
            )));
        }

        let tag_ids = inner.tag_ids_for_names(&target.tags);
        let stored = StoredTarget {
            name: target.name,
            url: target.url,
            is_production: target.is_production,
            tag_ids,
        };

        let row = inner.target_row(id, &stored);
        inner.targets.insert(id, stored);

        Ok(Some(row))
    }

    async fn delete_target(&self, id: i64) -> StorageResult<Option<TargetRow>> {
        let mut inner = self.inner.write().await;

        let Some(stored) = inner.targets.remove(&id) else {
            return Ok(None);
        };

        // Records stay behind as orphaned history
        Ok(Some(inner.target_row(id, &stored)))
    }

    async fn insert_tag(&self, name: &str) -> StorageResult<TagRow> {
        let mut inner = self.inner.write().await;

        if inner.tags.values().any(|n| n == name) {
            return Err(StorageError::Conflict(format!(
                "tag name already taken: {name}"
            )));
        }

        inner.next_tag_id += 1;
        let id = inner.next_tag_id;
        inner.tags.insert(id, name.to_string());

        Ok(TagRow {
            id,
            name: name.to_string(),
        })
    }

    async fn get_tag_by_name(&self, name: &str) -> StorageResult<Option<TagRow>> {
        let inner = self.inner.read().await;
        Ok(inner.tags.iter().find(|(_, n)| *n == name).map(|(id, n)| {
            TagRow {
                id: *id,
                name: n.clone(),
            }
        }))
    }

    async fn list_tags(&self) -> StorageResult<Vec<TagRow>> {
        let inner = self.inner.read().await;

        let mut tags: Vec<TagRow> = inner
            .tags
            .iter()
            .map(|(id, name)| TagRow {
                id: *id,
                name: name.clone(),
            })
            .collect();
        tags.sort_by_key(|t| t.id);

        Ok(tags)
    }

    async fn delete_tag(&self, id: i64) -> StorageResult<Option<TagRow>> {
        let mut inner = self.inner.write().await;

        let Some(name) = inner.tags.remove(&id) else {
            return Ok(None);
        };

        for target in inner.targets.values_mut() {
            target.tag_ids.retain(|tag_id| *tag_id != id);
        }

        Ok(Some(TagRow { id, name }))
    }

    async fn current_targets(&self) -> StorageResult<Vec<TargetSnapshot>> {
        let inner = self.inner.read().await;

        let mut snapshot: Vec<TargetSnapshot> = inner
            .targets
            .iter()
            .map(|(id, t)| TargetSnapshot {
                id: *id,
                url: t.url.clone(),
            })
            .collect();
        snapshot.sort_by_key(|t| t.id);

        Ok(snapshot)
    }

    async fn append_health_record(
        &self,
        target_id: i64,
        status: HealthStatus,
        latency: Option<f64>,
        observed_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let mut inner = self.inner.write().await;

        inner.next_record_id += 1;
        let id = inner.next_record_id;

        inner.records.entry(target_id).or_default().push(HealthRecordRow {
            id,
            target_id,
            status,
            latency,
            observed_at,
        });

        Ok(())
    }

    async fn latest_health_records(
        &self,
        target_id: i64,
        limit: usize,
    ) -> StorageResult<Vec<HealthRecordRow>> {
        let inner = self.inner.read().await;

        let mut records: Vec<HealthRecordRow> = inner
            .records
            .get(&target_id)
            .map(|r| r.clone())
            .unwrap_or_default();

        records.sort_by(|a, b| b.observed_at.cmp(&a.observed_at).then(b.id.cmp(&a.id)));
        records.truncate(limit);

        Ok(records)
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
