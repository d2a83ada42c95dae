//! Service error types.

use journal_storage::StorageError;
use thiserror::Error;

/// Errors from record operations.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// The operation requires an authenticated identity.
    #[error("Authentication required")]
    Unauthenticated,

    /// The storage layer failed.
    ///
    /// Wraps the original [`StorageError`] to preserve the full error
    /// source chain for debugging and structured logging.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),
}

impl ServiceError {
    /// Whether retrying the operation may succeed.
    ///
    /// Transient storage failures (connection loss, timeouts) are
    /// retryable; everything else is not.
    #[must_use]
    pub fn retryable(&self) -> bool {
        match self {
            Self::Persistence(err) => err.is_transient(),
            Self::Unauthenticated => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServiceError::Unauthenticated;
        assert_eq!(err.to_string(), "Authentication required");

        let err = ServiceError::Persistence(StorageError::timeout());
        assert_eq!(err.to_string(), "Persistence error: Operation timeout");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(!ServiceError::Unauthenticated.retryable());
        assert!(ServiceError::Persistence(StorageError::timeout()).retryable());
        assert!(ServiceError::Persistence(StorageError::connection("down")).retryable());
        assert!(!ServiceError::Persistence(StorageError::serialization("bad")).retryable());
    }

    #[test]
    fn test_from_storage_error_preserves_source() {
        use std::error::Error;

        let err: ServiceError = StorageError::connection("refused").into();
        assert!(err.source().is_some(), "source chain must be preserved");
    }
}
