//! The persisted record model.
//!
//! A [`Record`] is one journal entry owned by a single authenticated
//! principal. Records are created once and read back newest-first; no
//! update or delete operation exists at this layer, though
//! [`RecordStatus`] anticipates future transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    /// The record is open.
    #[default]
    Active,
    /// The record has been resolved.
    Resolved,
    /// The record has been archived.
    Archived,
}

/// A persisted journal record.
///
/// # Invariants
///
/// - `id` is assigned exactly once at creation by the service layer, never
///   by the caller.
/// - `owner` always equals the authenticated identity of the creating
///   request and never comes from the request payload.
/// - `(owner, created_at)` plus the id-derived sort suffix forms the
///   storage key; see [`crate::keys`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Globally unique identifier, server-assigned at creation.
    pub id: String,
    /// Identity of the principal that owns this record.
    pub owner: String,
    /// Creation timestamp; doubles as the sort key.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp. Equals `created_at` until mutations exist.
    pub updated_at: DateTime<Utc>,
    /// Free-text title.
    pub title: String,
    /// Free-text body.
    pub body: String,
    /// Lifecycle status, `ACTIVE` unless the draft said otherwise.
    #[serde(default)]
    pub status: RecordStatus,
    /// Who or what this record concerns.
    #[serde(default)]
    pub target: String,
    /// If this record was imported from a shared link, the identity or
    /// display name of the sharer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_by: Option<String>,
    /// Whether this record originated from a share.
    #[serde(default)]
    pub is_shared: bool,
}

impl Record {
    /// Returns the sort-key suffix that disambiguates same-owner writes
    /// landing on an identical timestamp.
    ///
    /// Derived from the record id, so it is stable for a given record and
    /// unique across records.
    #[must_use]
    pub fn sort_suffix(&self) -> &str {
        // Ids are UUIDs; the first segment is enough to break ties.
        self.id.get(..8).unwrap_or(&self.id)
    }
}

/// Caller-supplied fields for a new record.
///
/// Everything else on [`Record`] (id, owner, timestamps) is
/// server-assigned.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    /// Free-text title.
    pub title: String,
    /// Free-text body.
    pub body: String,
    /// Optional initial status; defaults to `ACTIVE` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    /// Who or what this record concerns.
    #[serde(default)]
    pub target: String,
    /// Sharing provenance, if imported from a shared link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_by: Option<String>,
    /// Whether this record originated from a share.
    #[serde(default)]
    pub is_shared: bool,
}
