//! Request authentication gate.
//!
//! [`AuthGate`] sits between the transport layer and the record service:
//! it extracts the bearer token from an `Authorization` header value,
//! runs the verifier, and converts any failure into a structured 401
//! rejection. The specific cause is logged server-side; callers only see
//! a stable machine-readable code and a generic message.
//!
//! Requests without credentials are governed by an explicit
//! [`UnauthenticatedPolicy`]; there is no implicit anonymous fallback.

use journal_authn::{AuthError, Identity, TokenVerifier};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// HTTP status for every authentication rejection.
const REJECTION_STATUS: u16 = 401;

/// Generic message returned to callers. The real cause stays in the logs.
const REJECTION_MESSAGE: &str = "Invalid or missing credentials";

/// Structured body for a rejected request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthRejection {
    /// HTTP status code, always 401.
    pub status: u16,
    /// Stable machine-readable reason code.
    pub code: &'static str,
    /// Generic human-readable message.
    pub message: String,
}

impl AuthRejection {
    fn new(code: &'static str) -> Self {
        Self { status: REJECTION_STATUS, code, message: REJECTION_MESSAGE.to_string() }
    }

    /// Rejection for a request that carried no credentials.
    #[must_use]
    pub fn missing_credentials() -> Self {
        Self::new("missing_credentials")
    }

    /// Rejection derived from a verification failure.
    #[must_use]
    pub fn from_error(err: &AuthError) -> Self {
        Self::new(err.reason_code())
    }
}

/// What to do with a request that carries no credentials.
#[derive(Clone, Debug)]
pub enum UnauthenticatedPolicy {
    /// Reject with `missing_credentials`.
    Reject,
    /// Proceed under a fixed identity. For trusted internal callers only;
    /// every record created this way is owned by that identity.
    AllowAs(Identity),
}

/// Authenticates requests ahead of the record service.
pub struct AuthGate {
    verifier: TokenVerifier,
    policy: UnauthenticatedPolicy,
}

impl AuthGate {
    /// Creates a gate with the given credential-absence policy.
    pub fn new(verifier: TokenVerifier, policy: UnauthenticatedPolicy) -> Self {
        Self { verifier, policy }
    }

    /// Authenticates a request from its `Authorization` header value.
    ///
    /// Cancellation of `cancel` aborts verification and rejects with the
    /// `timeout` code.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthRejection`] carrying the reason code; the cause
    /// detail is logged here and not returned.
    #[tracing::instrument(skip(self, authorization, cancel))]
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Identity, AuthRejection> {
        let raw = match authorization {
            Some(value) => match bearer_token(value) {
                Some(token) => token,
                None => {
                    tracing::warn!("authorization header is not a bearer credential");
                    return Err(AuthRejection::from_error(&AuthError::invalid_token_format(
                        "not a bearer credential",
                    )));
                },
            },
            None => match &self.policy {
                UnauthenticatedPolicy::AllowAs(identity) => {
                    tracing::debug!(identity = %identity, "request admitted under fixed identity");
                    return Ok(identity.clone());
                },
                UnauthenticatedPolicy::Reject => {
                    tracing::warn!("request without credentials rejected");
                    return Err(AuthRejection::missing_credentials());
                },
            },
        };

        let verified = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AuthError::timeout()),
            result = self.verifier.verify(raw) => result,
        };

        match verified {
            Ok(verified) => Ok(verified.identity),
            Err(err) => {
                // Cause detail stays server-side; the body carries the code only.
                tracing::warn!(reason = err.reason_code(), error = %err, "token rejected");
                Err(AuthRejection::from_error(&err))
            },
        }
    }
}

/// Extracts the token from a `Bearer` authorization header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}
