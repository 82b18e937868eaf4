//! Status Store abstraction.
//!
//! [`StatusStore`] is the single shared mutable resource of the system: a
//! key-value table of [`ProcessRecord`]s keyed by [`ProcessId`]. Two backends
//! ship with the crate, [`memory::MemoryStore`] and [`sqlite::SqliteStore`];
//! [`AnyStore`] picks one at runtime.
//!
//! Components take the store as an explicit `Arc<S>` constructor argument.

pub mod memory;
pub mod sqlite;

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::types::{ProcessId, ProcessRecord, StatusUpdate};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Durable record store with read-your-writes consistency for the writer.
pub trait StatusStore: Send + Sync + 'static {
    /// Create or overwrite the record stored under `record.process_id`.
    fn put(&self, record: ProcessRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Fetch a snapshot of the record, `None` if the id is unknown.
    fn get(
        &self,
        id: &ProcessId,
    ) -> impl Future<Output = Result<Option<ProcessRecord>, StoreError>> + Send;

    /// Apply a status transition and return the updated record.
    ///
    /// Fails with [`StoreError::NotFound`] for unknown ids and with
    /// [`StoreError::InvalidTransition`] when the state machine forbids the
    /// move. `updated_at` is refreshed; `task_type`, `parameters` and
    /// `created_at` are never touched.
    fn update(
        &self,
        id: &ProcessId,
        update: StatusUpdate,
    ) -> impl Future<Output = Result<ProcessRecord, StoreError>> + Send;

    /// `PROCESSING` records whose last transition happened before `cutoff`.
    ///
    /// `PENDING` records are never listed: while the pool is alive they are
    /// either queued or already failed on dispatch.
    fn list_stale(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<ProcessRecord>, StoreError>> + Send;

    /// Move every non-terminal record to `FAILED` with `detail`.
    /// Returns the number of records changed.
    fn fail_unfinished(&self, detail: &str) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

/// Runtime-selected store backend.
#[derive(Debug, Clone)]
pub enum AnyStore {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl StatusStore for AnyStore {
    async fn put(&self, record: ProcessRecord) -> Result<(), StoreError> {
        match self {
            AnyStore::Memory(s) => s.put(record).await,
            AnyStore::Sqlite(s) => s.put(record).await,
        }
    }

    async fn get(&self, id: &ProcessId) -> Result<Option<ProcessRecord>, StoreError> {
        match self {
            AnyStore::Memory(s) => s.get(id).await,
            AnyStore::Sqlite(s) => s.get(id).await,
        }
    }

    async fn update(&self, id: &ProcessId, update: StatusUpdate) -> Result<ProcessRecord, StoreError> {
        match self {
            AnyStore::Memory(s) => s.update(id, update).await,
            AnyStore::Sqlite(s) => s.update(id, update).await,
        }
    }

    async fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<ProcessRecord>, StoreError> {
        match self {
            AnyStore::Memory(s) => s.list_stale(cutoff).await,
            AnyStore::Sqlite(s) => s.list_stale(cutoff).await,
        }
    }

    async fn fail_unfinished(&self, detail: &str) -> Result<u64, StoreError> {
        match self {
            AnyStore::Memory(s) => s.fail_unfinished(detail).await,
            AnyStore::Sqlite(s) => s.fail_unfinished(detail).await,
        }
    }
}
