//! Recorder - appends classified probe results to storage
//!
//! Sits between the probe fan-out and the storage backend. Its one job
//! beyond delegation is failure isolation: a persistence error for one
//! target's record must not abort the cycle or prevent sibling targets
//! from being recorded, so errors are logged and swallowed here at the
//! storage-call boundary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::probe::Verdict;
use crate::storage::StorageBackend;

#[derive(Clone)]
pub struct Recorder {
    storage: Arc<dyn StorageBackend>,
}

impl Recorder {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Append one health record for a target
    ///
    /// Returns whether the record was persisted. Failures are logged
    /// and absorbed; the caller continues its fan-out either way.
    pub async fn record(
        &self,
        target_id: i64,
        verdict: Verdict,
        observed_at: DateTime<Utc>,
    ) -> bool {
        match self
            .storage
            .append_health_record(target_id, verdict.status, verdict.latency, observed_at)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to record health for target {target_id}: {e}");
                false
            }
        }
    }
}
