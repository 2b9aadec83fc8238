//! Shared API request and response types

use serde::{Deserialize, Serialize};

use crate::probe::HealthStatus;
use crate::storage::{HealthRecordRow, TagRow, TargetRow};

/// Service liveness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// One target in API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetResponse {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub is_production: bool,
    pub tags: Vec<TagResponse>,
}

impl From<TargetRow> for TargetResponse {
    fn from(row: TargetRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            url: row.url,
            is_production: row.is_production,
            tags: row.tags.into_iter().map(TagResponse::from).collect(),
        }
    }
}

/// One tag in API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
}

impl From<TagRow> for TagResponse {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// Payload for creating a tag
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTag {
    pub name: String,
}

/// One health observation in API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecordResponse {
    pub status: HealthStatus,
    pub latency: Option<f64>,
    pub observed_at: String,
}

impl From<HealthRecordRow> for HealthRecordResponse {
    fn from(row: HealthRecordRow) -> Self {
        Self {
            status: row.status,
            latency: row.latency,
            observed_at: row.observed_at.to_rfc3339(),
        }
    }
}

/// History query response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub target_id: i64,
    pub count: usize,
    pub records: Vec<HealthRecordResponse>,
}

/// Summary of a manually triggered probe cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickResponse {
    pub targets: usize,
    pub recorded: usize,
}
