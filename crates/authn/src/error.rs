//! Authentication error types.
//!
//! This module defines errors that can occur during token verification and
//! key set refresh. Every variant carries a stable machine-readable reason
//! code for structured rejection bodies; raw library or crypto error text
//! stays inside the process and goes to logs only.

use std::sync::Arc;

use thiserror::Error;

/// Boxed error type for wrapping upstream fetch errors.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Authentication errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Malformed token - cannot be decoded.
    #[error("Invalid token format: {0}")]
    InvalidTokenFormat(String),

    /// No published key matches the token's key ID.
    #[error("Signing key not found: {kid}")]
    KeyNotFound {
        /// Key ID that was not found.
        kid: String,
    },

    /// Algorithm not in allowed list.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Issuer doesn't match expected value.
    #[error("Invalid issuer: {0}")]
    InvalidIssuer(String),

    /// Audience doesn't match expected value.
    #[error("Invalid audience: {0}")]
    InvalidAudience(String),

    /// Token has expired beyond the clock-skew allowance.
    #[error("Token expired")]
    TokenExpired,

    /// Required claim is missing or empty.
    #[error("Missing claim: {0}")]
    MissingClaim(String),

    /// A deployment-specific claim check rejected the token.
    #[error("Claim rejected: {0}")]
    ClaimRejected(String),

    /// Fetching the published key set failed and no prior set exists.
    ///
    /// Wraps the upstream error to preserve the full source chain for
    /// debugging and structured logging.
    #[error("Key set fetch failed: {message}")]
    KeyFetch {
        /// What failed.
        message: String,
        /// The underlying fetch error, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The caller's deadline elapsed or the request was cancelled.
    #[error("Operation timeout")]
    Timeout,
}

impl AuthError {
    /// Creates an [`AuthError::InvalidTokenFormat`] error.
    pub fn invalid_token_format(message: impl Into<String>) -> Self {
        Self::InvalidTokenFormat(message.into())
    }

    /// Creates an [`AuthError::KeyNotFound`] error.
    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyNotFound { kid: kid.into() }
    }

    /// Creates an [`AuthError::UnsupportedAlgorithm`] error.
    pub fn unsupported_algorithm(message: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm(message.into())
    }

    /// Creates an [`AuthError::InvalidSignature`] error.
    #[must_use]
    pub fn invalid_signature() -> Self {
        Self::InvalidSignature
    }

    /// Creates an [`AuthError::InvalidIssuer`] error.
    pub fn invalid_issuer(message: impl Into<String>) -> Self {
        Self::InvalidIssuer(message.into())
    }

    /// Creates an [`AuthError::InvalidAudience`] error.
    pub fn invalid_audience(message: impl Into<String>) -> Self {
        Self::InvalidAudience(message.into())
    }

    /// Creates an [`AuthError::TokenExpired`] error.
    #[must_use]
    pub fn token_expired() -> Self {
        Self::TokenExpired
    }

    /// Creates an [`AuthError::MissingClaim`] error.
    pub fn missing_claim(claim: impl Into<String>) -> Self {
        Self::MissingClaim(claim.into())
    }

    /// Creates an [`AuthError::ClaimRejected`] error.
    pub fn claim_rejected(message: impl Into<String>) -> Self {
        Self::ClaimRejected(message.into())
    }

    /// Creates an [`AuthError::KeyFetch`] error without a source.
    pub fn key_fetch(message: impl Into<String>) -> Self {
        Self::KeyFetch { message: message.into(), source: None }
    }

    /// Creates an [`AuthError::KeyFetch`] error wrapping an upstream error.
    pub fn key_fetch_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::KeyFetch { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates an [`AuthError::Timeout`] error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Returns the stable machine-readable reason code for this error.
    ///
    /// These codes are the only part of an authentication failure exposed
    /// to callers; the variant detail is logged server-side.
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::InvalidTokenFormat(_) => "malformed_token",
            Self::KeyNotFound { .. } => "unknown_key",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::InvalidSignature => "bad_signature",
            Self::InvalidIssuer(_) => "bad_issuer",
            Self::InvalidAudience(_) => "bad_audience",
            Self::TokenExpired => "token_expired",
            Self::MissingClaim(_) => "missing_claim",
            Self::ClaimRejected(_) => "claim_rejected",
            Self::KeyFetch { .. } => "key_fetch_failed",
            Self::Timeout => "timeout",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidToken => {
                AuthError::InvalidTokenFormat("Invalid token structure".into())
            },
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidAudience => {
                AuthError::InvalidAudience("Audience validation failed".into())
            },
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer("Issuer validation failed".into()),
            ErrorKind::InvalidAlgorithm => {
                AuthError::UnsupportedAlgorithm("Algorithm not supported".into())
            },
            _ => AuthError::InvalidTokenFormat(format!("Token error: {}", err)),
        }
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_token_format("test");
        assert_eq!(err.to_string(), "Invalid token format: test");

        let err = AuthError::token_expired();
        assert_eq!(err.to_string(), "Token expired");

        let err = AuthError::key_not_found("key-123");
        assert_eq!(err.to_string(), "Signing key not found: key-123");

        let err = AuthError::missing_claim("sub");
        assert_eq!(err.to_string(), "Missing claim: sub");
    }

    #[test]
    fn test_reason_codes_are_stable() {
        let cases: Vec<(AuthError, &str)> = vec![
            (AuthError::invalid_token_format("x"), "malformed_token"),
            (AuthError::key_not_found("k"), "unknown_key"),
            (AuthError::unsupported_algorithm("HS256"), "unsupported_algorithm"),
            (AuthError::invalid_signature(), "bad_signature"),
            (AuthError::invalid_issuer("x"), "bad_issuer"),
            (AuthError::invalid_audience("x"), "bad_audience"),
            (AuthError::token_expired(), "token_expired"),
            (AuthError::missing_claim("sub"), "missing_claim"),
            (AuthError::claim_rejected("x"), "claim_rejected"),
            (AuthError::key_fetch("x"), "key_fetch_failed"),
            (AuthError::timeout(), "timeout"),
        ];
        for (err, code) in cases {
            assert_eq!(err.reason_code(), code, "reason code for {err:?}");
        }
    }

    #[test]
    fn test_reason_codes_never_leak_detail() {
        // The rejection body carries only the code, never the variant text,
        // so codes must not contain token or key material placeholders.
        let err = AuthError::key_not_found("secret-kid-value");
        assert!(!err.reason_code().contains("secret"));
    }

    #[test]
    fn test_error_from_jsonwebtoken() {
        let jwt_err =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::ExpiredSignature);
        let auth_err: AuthError = jwt_err.into();
        assert!(matches!(auth_err, AuthError::TokenExpired));

        let jwt_err =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidSignature);
        let auth_err: AuthError = jwt_err.into();
        assert!(matches!(auth_err, AuthError::InvalidSignature));
    }

    #[test]
    fn test_key_fetch_preserves_source_chain() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = AuthError::key_fetch_with_source("endpoint unreachable", io_err);

        assert_eq!(err.to_string(), "Key set fetch failed: endpoint unreachable");
        let source = err.source().expect("source chain must be preserved");
        assert_eq!(source.to_string(), "refused");
    }
}
