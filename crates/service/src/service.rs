//! Record operations for an authenticated principal.
//!
//! [`RecordService`] owns the invariants the storage layer cannot see:
//! ids are server-assigned exactly once, ownership always comes from the
//! authenticated identity and never from the payload, and timestamps are
//! set at creation.

use std::sync::Arc;

use chrono::Utc;
use journal_authn::Identity;
use journal_storage::{Record, RecordDraft, RecordStore, StorageError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::ServiceError;

/// Creates and lists records on behalf of authenticated principals.
pub struct RecordService {
    store: Arc<dyn RecordStore>,
}

impl RecordService {
    /// Creates a service over the given record store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Creates a record from a caller-supplied draft.
    ///
    /// The id, owner, and timestamps are assigned here; nothing in the
    /// draft can influence them. Cancellation of `cancel` aborts the
    /// write and surfaces as a retryable persistence timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthenticated`] for an empty identity,
    /// or [`ServiceError::Persistence`] when the store fails.
    #[tracing::instrument(skip(self, draft, cancel), fields(owner = %identity))]
    pub async fn create(
        &self,
        identity: &Identity,
        draft: RecordDraft,
        cancel: &CancellationToken,
    ) -> Result<Record, ServiceError> {
        // Identity can arrive deserialized, so the non-empty invariant is
        // re-checked at the trust boundary.
        if identity.as_str().is_empty() {
            return Err(ServiceError::Unauthenticated);
        }

        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4().to_string(),
            owner: identity.as_str().to_string(),
            created_at: now,
            updated_at: now,
            title: draft.title,
            body: draft.body,
            status: draft.status.unwrap_or_default(),
            target: draft.target,
            shared_by: draft.shared_by,
            is_shared: draft.is_shared,
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ServiceError::Persistence(StorageError::timeout())),
            result = self.store.save(&record) => result.map_err(ServiceError::from),
        }?;

        tracing::debug!(id = %record.id, "record created");
        Ok(record)
    }

    /// Lists the principal's records, newest first, capped at `limit`.
    ///
    /// A principal with no records gets an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthenticated`] for an empty identity,
    /// or [`ServiceError::Persistence`] when the store fails.
    #[tracing::instrument(skip(self, cancel), fields(owner = %identity))]
    pub async fn list(
        &self,
        identity: &Identity,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>, ServiceError> {
        if identity.as_str().is_empty() {
            return Err(ServiceError::Unauthenticated);
        }

        let records = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ServiceError::Persistence(StorageError::timeout())),
            result = self.store.list_by_owner(identity.as_str(), limit) => {
                result.map_err(ServiceError::from)
            },
        }?;

        tracing::debug!(count = records.len(), "records listed");
        Ok(records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use journal_storage::{KvRecordStore, MemoryBackend, RecordStatus};

    use super::*;

    fn service() -> RecordService {
        let backend = Arc::new(MemoryBackend::new());
        RecordService::new(Arc::new(KvRecordStore::new(backend, "records")))
    }

    fn identity(subject: &str) -> Identity {
        Identity::new(subject).unwrap()
    }

    fn draft(title: &str, body: &str) -> RecordDraft {
        RecordDraft { title: title.into(), body: body.into(), ..RecordDraft::default() }
    }

    #[tokio::test]
    async fn test_create_assigns_server_fields() {
        let service = service();
        let cancel = CancellationToken::new();

        let record = service
            .create(&identity("auth0|user-1"), draft("Title", "Body"), &cancel)
            .await
            .unwrap();

        assert!(!record.id.is_empty());
        assert_eq!(record.owner, "auth0|user-1");
        assert_eq!(record.title, "Title");
        assert_eq!(record.body, "Body");
        assert_eq!(record.status, RecordStatus::Active);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn test_create_honors_draft_status() {
        let service = service();
        let cancel = CancellationToken::new();
        let mut d = draft("T", "B");
        d.status = Some(RecordStatus::Archived);

        let record = service.create(&identity("auth0|user-1"), d, &cancel).await.unwrap();
        assert_eq!(record.status, RecordStatus::Archived);
    }

    #[tokio::test]
    async fn test_create_assigns_distinct_ids() {
        let service = service();
        let cancel = CancellationToken::new();
        let id = identity("auth0|user-1");

        let a = service.create(&id, draft("A", "a"), &cancel).await.unwrap();
        let b = service.create(&id, draft("B", "b"), &cancel).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_list_round_trip_newest_first() {
        let service = service();
        let cancel = CancellationToken::new();
        let id = identity("auth0|user-1");

        let first = service.create(&id, draft("First", "1"), &cancel).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = service.create(&id, draft("Second", "2"), &cancel).await.unwrap();

        let listed = service.list(&id, 10, &cancel).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_list_empty_is_ok() {
        let service = service();
        let cancel = CancellationToken::new();

        let listed = service.list(&identity("auth0|nobody"), 10, &cancel).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_owner_comes_from_identity_not_payload() {
        let service = service();
        let cancel = CancellationToken::new();
        let alice = identity("auth0|alice");
        let bob = identity("auth0|bob");

        service.create(&alice, draft("Alice's", "a"), &cancel).await.unwrap();

        let bobs = service.list(&bob, 10, &cancel).await.unwrap();
        assert!(bobs.is_empty(), "records must never cross owners");
    }

    #[tokio::test]
    async fn test_cancelled_create_times_out() {
        let service = service();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = service.create(&identity("auth0|user-1"), draft("T", "B"), &cancel).await;
        match result {
            Err(ServiceError::Persistence(StorageError::Timeout)) => {},
            other => panic!("expected timeout, got {other:?}"),
        }
        let err = service.create(&identity("auth0|user-1"), draft("T", "B"), &cancel).await;
        assert!(err.unwrap_err().retryable(), "cancellation must surface as retryable");
    }

    #[tokio::test]
    async fn test_cancelled_list_times_out() {
        let service = service();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = service.list(&identity("auth0|user-1"), 10, &cancel).await;
        assert!(matches!(result, Err(ServiceError::Persistence(StorageError::Timeout))));
    }

    #[tokio::test]
    async fn test_empty_identity_rejected() {
        let service = service();
        let cancel = CancellationToken::new();
        // Bypass the constructor the way a deserializer would.
        let empty: Identity = serde_json::from_str(r#""""#).unwrap();

        let result = service.create(&empty, draft("T", "B"), &cancel).await;
        assert!(matches!(result, Err(ServiceError::Unauthenticated)));

        let result = service.list(&empty, 10, &cancel).await;
        assert!(matches!(result, Err(ServiceError::Unauthenticated)));
    }
}
