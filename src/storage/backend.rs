//! Storage backend trait definition
//!
//! This module defines the core `StorageBackend` trait that all
//! storage implementations must implement. It carries two distinct
//! concerns behind one handle:
//!
//! - the **registry**: CRUD for targets and tags (mutated only through
//!   the API, read by the scheduler as a snapshot)
//! - the **history**: append-only health records and the bounded
//!   "latest records" query

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::probe::HealthStatus;

use super::error::StorageResult;
use super::schema::{HealthRecordRow, NewTarget, TagRow, TargetFilter, TargetRow, TargetSnapshot};

/// Trait for persistent storage backends
///
/// Implementations must be `Send + Sync` as they are shared across
/// async tasks (the scheduler fan-out and the API handlers read and
/// write concurrently).
///
/// Methods return `StorageResult<T>` wrapping `StorageError`;
/// implementations convert backend-specific errors into its variants.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    // ========================================================================
    // Registry: targets
    // ========================================================================

    /// Create a target
    ///
    /// Fails with `StorageError::Conflict` when the name is taken.
    /// Tag names that do not exist in the registry are ignored.
    async fn insert_target(&self, target: NewTarget) -> StorageResult<TargetRow>;

    /// Fetch a single target by id
    async fn get_target(&self, id: i64) -> StorageResult<Option<TargetRow>>;

    /// Fetch a single target by its unique name
    async fn get_target_by_name(&self, name: &str) -> StorageResult<Option<TargetRow>>;

    /// List targets with optional production filter and paging
    async fn list_targets(&self, filter: TargetFilter) -> StorageResult<Vec<TargetRow>>;

    /// Replace a target's fields (including its tag set)
    ///
    /// Returns `None` when the id is unknown.
    async fn update_target(&self, id: i64, target: NewTarget) -> StorageResult<Option<TargetRow>>;

    /// Delete a target, returning the deleted row
    ///
    /// Health records for the target are left in place (orphaned);
    /// history keeps audit value on its own.
    async fn delete_target(&self, id: i64) -> StorageResult<Option<TargetRow>>;

    // ========================================================================
    // Registry: tags
    // ========================================================================

    /// Create a tag; fails with `Conflict` on duplicate name
    async fn insert_tag(&self, name: &str) -> StorageResult<TagRow>;

    /// Fetch a tag by its unique name
    async fn get_tag_by_name(&self, name: &str) -> StorageResult<Option<TagRow>>;

    /// List all tags
    async fn list_tags(&self) -> StorageResult<Vec<TagRow>>;

    /// Delete a tag, detaching it from all targets
    async fn delete_tag(&self, id: i64) -> StorageResult<Option<TagRow>>;

    // ========================================================================
    // Probe pipeline
    // ========================================================================

    /// Snapshot of all targets for one probe cycle
    ///
    /// Returns value copies - the scheduler holds no live reference, so
    /// registry mutations during a cycle only take effect on the next
    /// one.
    async fn current_targets(&self) -> StorageResult<Vec<TargetSnapshot>>;

    /// Append one immutable health record
    ///
    /// Inserts are independent and unordered across targets within a
    /// cycle; no cross-record transaction is needed.
    async fn append_health_record(
        &self,
        target_id: i64,
        status: HealthStatus,
        latency: Option<f64>,
        observed_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// The `limit` most recent health records for a target, newest first
    ///
    /// An unknown target or an empty history yields an empty vec, not
    /// an error.
    async fn latest_health_records(
        &self,
        target_id: i64,
        limit: usize,
    ) -> StorageResult<Vec<HealthRecordRow>>;

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Verify the backend is reachable (lightweight ping)
    async fn ping(&self) -> StorageResult<()>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
