//! Storage backend trait definition.
//!
//! This module defines [`StorageBackend`], the core abstraction for
//! key-value storage. The record repository ([`crate::store`]) is built
//! on top of this trait; domain logic never lives in a backend.
//!
//! # Design Philosophy
//!
//! - **Keys and values are bytes**: no assumptions about serialization format
//! - **Async by default**: all operations are async for non-blocking I/O
//! - **Reverse range scans**: partition listings read newest-first with a
//!   result cap, so the trait exposes a bounded descending scan directly
//!   rather than an unbounded iterator
//!
//! The trait is object-safe (`Arc<dyn StorageBackend>`), which is why the
//! scan takes explicit `start`/`end` byte bounds instead of a generic
//! `RangeBounds` parameter.
//!
//! # Implementing a Backend
//!
//! 1. Implement [`StorageBackend`]
//! 2. Map backend-specific errors to [`StorageError`](crate::StorageError)
//!
//! See [`MemoryBackend`](crate::MemoryBackend) for a reference implementation.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{error::StorageResult, types::KeyValue};

/// Abstract storage backend for key-value operations.
///
/// Backends are expected to be thread-safe (`Send + Sync`) and to support
/// concurrent operations; no cross-call locking is required of callers.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use journal_storage::{MemoryBackend, StorageBackend};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let backend = MemoryBackend::new();
///
/// backend.set(b"key".to_vec(), b"value".to_vec()).await.unwrap();
/// let value = backend.get(b"key").await.unwrap();
/// assert_eq!(value, Some(Bytes::from("value")));
/// # });
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Stores a key-value pair.
    ///
    /// If the key already exists, its value is overwritten (upsert
    /// semantics). Writes are immediately visible to subsequent reads.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()>;

    /// Retrieves at most `limit` entries with keys in `[start, end)`,
    /// ordered by key **descending** (largest key first).
    ///
    /// Because keys encode sortable timestamps, descending key order is
    /// reverse-chronological order for a single partition.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get_range_rev(
        &self,
        start: Vec<u8>,
        end: Vec<u8>,
        limit: usize,
    ) -> StorageResult<Vec<KeyValue>>;

    /// Verifies the backend is reachable and able to serve requests.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn health_check(&self) -> StorageResult<()>;
}
