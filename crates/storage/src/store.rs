//! Record repository over a [`StorageBackend`].
//!
//! [`RecordStore`] is the capability abstraction the service layer talks
//! to; [`KvRecordStore`] is the concrete implementation that maps records
//! onto the compound key space defined in [`crate::keys`]. Tests can
//! substitute any other [`RecordStore`] implementation without touching
//! the service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    backend::StorageBackend,
    error::{StorageError, StorageResult},
    keys,
    record::Record,
};

/// Persistence operations for records.
///
/// Implementations must guarantee read-after-write visibility: a record
/// returned by a completed [`save`](RecordStore::save) appears in the next
/// [`list_by_owner`](RecordStore::list_by_owner) for the same owner.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes a record keyed by `(owner, created_at, suffix)`.
    ///
    /// Idempotent for an identical key and payload. A same-key write with
    /// a different payload silently overwrites (upsert semantics); the
    /// id-derived suffix makes that reachable only by re-saving the same
    /// record, not by two distinct creations colliding on a timestamp.
    async fn save(&self, record: &Record) -> StorageResult<()>;

    /// Returns at most `limit` records for `owner`, strictly descending by
    /// creation timestamp (newest first).
    ///
    /// History beyond `limit` is unreachable; there is no pagination
    /// cursor. An owner with no records yields an empty vector, not an
    /// error.
    async fn list_by_owner(&self, owner: &str, limit: usize) -> StorageResult<Vec<Record>>;
}

/// [`RecordStore`] backed by any [`StorageBackend`].
///
/// Records are serialized as JSON values; the table name scopes the key
/// space so several logical tables can share one backend.
pub struct KvRecordStore {
    backend: Arc<dyn StorageBackend>,
    table: String,
}

impl KvRecordStore {
    /// Creates a record store writing into `table` on the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, table: impl Into<String>) -> Self {
        Self { backend, table: table.into() }
    }
}

#[async_trait]
impl RecordStore for KvRecordStore {
    #[tracing::instrument(skip(self, record), fields(owner = %record.owner, id = %record.id))]
    async fn save(&self, record: &Record) -> StorageResult<()> {
        let key =
            keys::record_key(&self.table, &record.owner, record.created_at, record.sort_suffix())?;
        let value = serde_json::to_vec(record)
            .map_err(|e| StorageError::serialization_with_source("failed to encode record", e))?;

        self.backend.set(key, value).await?;
        tracing::debug!("record saved");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_by_owner(&self, owner: &str, limit: usize) -> StorageResult<Vec<Record>> {
        let (start, end) = keys::owner_range(&self.table, owner)?;
        let entries = self.backend.get_range_rev(start, end, limit).await?;

        // A single undecodable entry fails the whole listing. Silently
        // dropping it would hide corruption from the caller.
        let mut records = Vec::with_capacity(entries.len());
        for kv in entries {
            let record: Record = serde_json::from_slice(&kv.value).map_err(|e| {
                tracing::error!(key = ?kv.key, error = %e, "undecodable record in listing");
                StorageError::serialization_with_source("failed to decode stored record", e)
            })?;
            records.push(record);
        }

        tracing::debug!(count = records.len(), "records listed");
        Ok(records)
    }
}
