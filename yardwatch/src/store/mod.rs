//! Durable state: tracked entities and the alert log.
//!
//! The [`EntityStore`] trait is the single source of truth that consumers
//! query. The tracking engine writes through it; nothing else performs I/O
//! against the stored state.
//!
//! # Providers
//!
//! - [`SqliteEntityStore`]: SQLite file with `entities` and `alerts` tables.
//!   Opens a short-lived connection per operation, so no handle is ever
//!   shared between threads.
//! - [`MemoryEntityStore`]: process-local maps, for tests and dry runs.
//!
//! # Consistency
//!
//! Upserts are idempotent by id (last write wins). Reads return snapshots
//! ordered most recent first; a reader sees each record either before or
//! after a concurrent write, never half-written.

mod memory;
mod sqlite;

use thiserror::Error;
use uuid::Uuid;

use crate::model::{Alert, TrackedEntity};

pub use memory::MemoryEntityStore;
pub use sqlite::SqliteEntityStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage could not be reached or opened.
    #[error("storage unavailable at {location}: {reason}")]
    Unavailable { location: String, reason: String },

    /// SQLite reported an error while executing a statement.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored row could not be decoded.
    #[error("corrupt {table} row '{id}': {reason}")]
    Corrupt {
        table: &'static str,
        id: String,
        reason: String,
    },

    /// No alert with the given id exists.
    #[error("alert {0} not found")]
    NotFound(Uuid),
}

/// Durable storage for tracked entities and alerts.
///
/// Implementations must be safe to call concurrently from the scheduler and
/// any number of consumer threads.
pub trait EntityStore: Send + Sync {
    /// Insert or replace an entity, keyed by id.
    fn upsert_entity(&self, entity: &TrackedEntity) -> StoreResult<()>;

    /// All entities ever stored, most recently seen first.
    fn list_entities(&self) -> StoreResult<Vec<TrackedEntity>>;

    /// Record an alert. Re-appending the same id replaces the row.
    fn append_alert(&self, alert: &Alert) -> StoreResult<()>;

    /// All alerts, most recent first.
    fn list_alerts(&self) -> StoreResult<Vec<Alert>>;

    /// Mark an alert resolved.
    fn resolve_alert(&self, id: Uuid) -> StoreResult<()>;

    /// Number of stored entities.
    fn count_entities(&self) -> StoreResult<usize> {
        Ok(self.list_entities()?.len())
    }

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}
