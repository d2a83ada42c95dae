//! In-memory storage backend implementation.
//!
//! [`MemoryBackend`] is an in-memory implementation of
//! [`StorageBackend`] suitable for testing and development.
//!
//! # Features
//!
//! - **Thread-safe**: uses [`parking_lot::RwLock`] for concurrent access
//! - **Ordered storage**: keys live in a [`BTreeMap`], so range scans are
//!   efficient and key order is total
//! - **Read-after-write**: a completed `set` is visible to every
//!   subsequent `get` or scan
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - No replication or distributed features

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::{backend::StorageBackend, error::StorageResult, types::KeyValue};

/// In-memory storage backend using [`BTreeMap`].
///
/// Primarily intended for tests, but usable anywhere persistence is not
/// required.
///
/// # Cloning
///
/// `MemoryBackend` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying data store.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Bytes>>>,
}

impl MemoryBackend {
    /// Creates a new, empty in-memory storage backend.
    ///
    /// # Example
    ///
    /// ```
    /// use journal_storage::MemoryBackend;
    ///
    /// let backend = MemoryBackend::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns `true` if the backend holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        let data = self.data.read();
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        let mut data = self.data.write();
        data.insert(key, Bytes::from(value));
        Ok(())
    }

    async fn get_range_rev(
        &self,
        start: Vec<u8>,
        end: Vec<u8>,
        limit: usize,
    ) -> StorageResult<Vec<KeyValue>> {
        if start >= end || limit == 0 {
            return Ok(Vec::new());
        }

        let data = self.data.read();
        let results: Vec<KeyValue> = data
            .range(start..end)
            .rev()
            .take(limit)
            .map(|(k, v)| KeyValue::new(Bytes::copy_from_slice(k), v.clone()))
            .collect();

        Ok(results)
    }

    async fn health_check(&self) -> StorageResult<()> {
        // Acquiring the read lock verifies we are not deadlocked.
        let _unused = self.data.read();
        Ok(())
    }
}
