//! Row definitions for the registry and the health record history
//!
//! Targets and tags form the registry: ordinary mutable rows with a
//! many-to-many link. Health records are different - they are append
//! only, written once per target per probe cycle and never updated.
//! A record keeps its `target_id` even after the target is deleted
//! (orphaned history, no cascade), so the column is a plain integer
//! reference rather than an enforced foreign key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::probe::HealthStatus;

/// A registered application under monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRow {
    pub id: i64,

    /// Unique display name
    pub name: String,

    /// URL probed every cycle
    pub url: String,

    /// Whether this is a production deployment
    pub is_production: bool,

    /// Tags attached to this target
    pub tags: Vec<TagRow>,
}

/// Payload for creating or updating a target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTarget {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub is_production: bool,

    /// Tag names to attach; names that do not exist are ignored
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A tag, shared across targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRow {
    pub id: i64,
    pub name: String,
}

/// The slice of a target the probe pipeline needs
///
/// Snapshots are value copies taken once at cycle start; the scheduler
/// never holds a live reference into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSnapshot {
    pub id: i64,
    pub url: String,
}

/// One immutable health observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecordRow {
    pub id: i64,

    /// Target this observation belongs to (may be orphaned)
    pub target_id: i64,

    pub status: HealthStatus,

    /// Response time in seconds; present exactly when status is up
    pub latency: Option<f64>,

    /// When the observation was made (always UTC)
    pub observed_at: DateTime<Utc>,
}

/// Paging and filter parameters for target listings
#[derive(Debug, Clone, Default)]
pub struct TargetFilter {
    pub is_production: Option<bool>,
    pub skip: usize,
    pub limit: Option<usize>,
}
