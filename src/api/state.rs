//! API shared state

use std::sync::Arc;

use crate::scheduler::SchedulerHandle;
use crate::storage::StorageBackend;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Storage backend for registry reads/writes and history queries
    pub storage: Arc<dyn StorageBackend>,

    /// Handle to the scheduler, for manual probe cycles
    pub scheduler: SchedulerHandle,
}

impl ApiState {
    pub fn new(storage: Arc<dyn StorageBackend>, scheduler: SchedulerHandle) -> Self {
        Self { storage, scheduler }
    }
}
