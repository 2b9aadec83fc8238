//! Storage backends for the registry and the health record history
//!
//! ## Design
//!
//! - **Trait-based**: `StorageBackend` allows swapping implementations
//! - **Async**: All operations are async for compatibility with Tokio
//! - **Append-only history**: health records are inserted, never updated
//!
//! ## Backends
//!
//! - **SQLite** (default): Embedded database, durable across restarts
//! - **In-Memory**: No persistence, for testing or the `"none"` config

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use schema::{HealthRecordRow, NewTarget, TagRow, TargetFilter, TargetRow, TargetSnapshot};
