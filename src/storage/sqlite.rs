//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the
//! `StorageBackend` trait.
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Better concurrency for reads during writes
//! - **Connection pooling**: Efficient resource usage
//! - **Migrations**: Automatic schema versioning with sqlx
//!
//! Health record inserts from the probe fan-out arrive concurrently and
//! unordered; each insert is a single independent statement, so there is
//! no cross-record transaction to contend on.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument};

use crate::probe::HealthStatus;

use super::backend::StorageBackend;
use super::error::{StorageError, StorageResult};
use super::schema::{HealthRecordRow, NewTarget, TagRow, TargetFilter, TargetRow, TargetSnapshot};

/// SQLite storage backend
///
/// Stores the registry and the health record history in a local SQLite
/// database file. Ideal for small to medium registries.
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
}

impl SqliteBackend {
    /// Create a new SQLite backend
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Run migrations to create tables
    /// 3. Configure SQLite for optimal performance (WAL mode, etc.)
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("database migrations complete");

        Ok(Self { pool })
    }

    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    /// Load the tags attached to a target
    async fn load_tags(&self, target_id: i64) -> StorageResult<Vec<TagRow>> {
        let rows = sqlx::query(
            r#"
            SELECT tags.id, tags.name
            FROM tags
            JOIN target_tags ON target_tags.tag_id = tags.id
            WHERE target_tags.target_id = ?
            ORDER BY tags.name ASC
            "#,
        )
        .bind(target_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TagRow {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    /// Replace the tag set of a target with the tags named in `names`
    ///
    /// Names without a matching tag row are silently skipped.
    async fn replace_tags(&self, target_id: i64, names: &[String]) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM target_tags WHERE target_id = ?")
            .bind(target_id)
            .execute(&mut *tx)
            .await?;

        for name in names {
            sqlx::query(
                r#"
                INSERT INTO target_tags (target_id, tag_id)
                SELECT ?, id FROM tags WHERE name = ?
                "#,
            )
            .bind(target_id)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn target_from_row(&self, row: sqlx::sqlite::SqliteRow) -> StorageResult<TargetRow> {
        let id: i64 = row.get("id");
        let tags = self.load_tags(id).await?;

        Ok(TargetRow {
            id,
            name: row.get("name"),
            url: row.get("url"),
            is_production: row.get::<i64, _>("is_production") != 0,
            tags,
        })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    #[instrument(skip(self), fields(name = %target.name))]
    async fn insert_target(&self, target: NewTarget) -> StorageResult<TargetRow> {
        let result = sqlx::query("INSERT INTO targets (name, url, is_production) VALUES (?, ?, ?)")
            .bind(&target.name)
            .bind(&target.url)
            .bind(target.is_production as i64)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();

        if !target.tags.is_empty() {
            self.replace_tags(id, &target.tags).await?;
        }

        debug!("created target {} ({})", target.name, id);

        self.get_target(id).await?.ok_or_else(|| {
            StorageError::QueryFailed("inserted target disappeared".to_string())
        })
    }

    async fn get_target(&self, id: i64) -> StorageResult<Option<TargetRow>> {
        let row = sqlx::query("SELECT id, name, url, is_production FROM targets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.target_from_row(row).await?)),
            None => Ok(None),
        }
    }

    async fn get_target_by_name(&self, name: &str) -> StorageResult<Option<TargetRow>> {
        let row = sqlx::query("SELECT id, name, url, is_production FROM targets WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.target_from_row(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_targets(&self, filter: TargetFilter) -> StorageResult<Vec<TargetRow>> {
        // LIMIT -1 means "no limit" in SQLite
        let limit = filter.limit.map(|l| l as i64).unwrap_or(-1);

        let rows = match filter.is_production {
            Some(is_production) => {
                sqlx::query(
                    r#"
                    SELECT id, name, url, is_production FROM targets
                    WHERE is_production = ?
                    ORDER BY id ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(is_production as i64)
                .bind(limit)
                .bind(filter.skip as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, name, url, is_production FROM targets
                    ORDER BY id ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(limit)
                .bind(filter.skip as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut targets = Vec::with_capacity(rows.len());
        for row in rows {
            targets.push(self.target_from_row(row).await?);
        }

        Ok(targets)
    }

    #[instrument(skip(self, target))]
    async fn update_target(&self, id: i64, target: NewTarget) -> StorageResult<Option<TargetRow>> {
        let result = sqlx::query("UPDATE targets SET name = ?, url = ?, is_production = ? WHERE id = ?")
            .bind(&target.name)
            .bind(&target.url)
            .bind(target.is_production as i64)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.replace_tags(id, &target.tags).await?;

        self.get_target(id).await
    }

    #[instrument(skip(self))]
    async fn delete_target(&self, id: i64) -> StorageResult<Option<TargetRow>> {
        let Some(existing) = self.get_target(id).await? else {
            return Ok(None);
        };

        // target_tags rows go with the target; health records stay
        // behind as orphaned history
        sqlx::query("DELETE FROM targets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!("deleted target {} ({})", existing.name, id);

        Ok(Some(existing))
    }

    async fn insert_tag(&self, name: &str) -> StorageResult<TagRow> {
        let result = sqlx::query("INSERT INTO tags (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(TagRow {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    async fn get_tag_by_name(&self, name: &str) -> StorageResult<Option<TagRow>> {
        let row = sqlx::query("SELECT id, name FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| TagRow {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    async fn list_tags(&self) -> StorageResult<Vec<TagRow>> {
        let rows = sqlx::query("SELECT id, name FROM tags ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| TagRow {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn delete_tag(&self, id: i64) -> StorageResult<Option<TagRow>> {
        let row = sqlx::query("SELECT id, name FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tag = TagRow {
            id: row.get("id"),
            name: row.get("name"),
        };

        sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Some(tag))
    }

    async fn current_targets(&self) -> StorageResult<Vec<TargetSnapshot>> {
        let rows = sqlx::query("SELECT id, url FROM targets ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| TargetSnapshot {
                id: row.get("id"),
                url: row.get("url"),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn append_health_record(
        &self,
        target_id: i64,
        status: HealthStatus,
        latency: Option<f64>,
        observed_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO health_records (target_id, status, latency, observed_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(target_id)
        .bind(status.to_string())
        .bind(latency)
        .bind(Self::timestamp_to_millis(&observed_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn latest_health_records(
        &self,
        target_id: i64,
        limit: usize,
    ) -> StorageResult<Vec<HealthRecordRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, target_id, status, latency, observed_at
            FROM health_records
            WHERE target_id = ?
            ORDER BY observed_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(target_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let records: Result<Vec<HealthRecordRow>, StorageError> = rows
            .into_iter()
            .map(|row| {
                let status: String = row.get("status");
                let status = status
                    .parse::<HealthStatus>()
                    .map_err(StorageError::QueryFailed)?;

                Ok(HealthRecordRow {
                    id: row.get("id"),
                    target_id: row.get("target_id"),
                    status,
                    latency: row.get("latency"),
                    observed_at: Self::millis_to_timestamp(row.get("observed_at")),
                })
            })
            .collect();

        let results = records?;
        debug!("query returned {} health records", results.len());
        Ok(results)
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
