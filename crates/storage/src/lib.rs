//! # Journal Storage
//!
//! Key-value persistence for journal records.
//!
//! This crate provides:
//! - **`StorageBackend`**: a minimal byte-oriented key-value abstraction
//!   with bounded reverse range scans
//! - **`MemoryBackend`**: a thread-safe in-memory reference implementation
//! - **`RecordStore`**: the record repository, mapping each record onto a
//!   `(table, owner, created_at, suffix)` compound key so one owner's
//!   records form a contiguous, chronologically ordered range
//!
//! ## Key design
//!
//! The partition key is the owner identity and the sort key is a
//! fixed-width creation timestamp plus an id-derived suffix. Listing an
//! owner's records is a single descending range scan with a result cap;
//! the suffix guarantees two same-owner creations can never silently
//! overwrite each other even at identical timestamps.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use journal_storage::{KvRecordStore, MemoryBackend, RecordStore};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = Arc::new(MemoryBackend::new());
//! let store = KvRecordStore::new(backend, "records");
//!
//! let listed = store.list_by_owner("auth0|user-1", 50).await.unwrap();
//! assert!(listed.is_empty());
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Storage backend trait.
pub mod backend;
/// Storage error types.
pub mod error;
/// Compound key encoding for the record key space.
pub mod keys;
/// In-memory backend implementation.
pub mod memory;
/// The persisted record model.
pub mod record;
/// Record repository over a storage backend.
pub mod store;
/// Shared storage types.
pub mod types;

pub use backend::StorageBackend;
pub use error::{BoxError, StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use record::{Record, RecordDraft, RecordStatus};
pub use store::{KvRecordStore, RecordStore};
pub use types::KeyValue;
