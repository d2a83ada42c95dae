//! Token verification pipeline.
//!
//! [`TokenVerifier`] runs the full check sequence over a raw bearer token:
//! structure, key resolution, algorithm, signature, issuer, audience,
//! expiry with clock-skew allowance, then any deployment-specific claim
//! check. No claim is trusted before the signature verifies, and no
//! network I/O happens after the signing key is resolved.

use std::{fmt, sync::Arc, time::Duration};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::AuthError,
    jwks::KeyCache,
    jwt::{Claims, decode_token_header, verify_signature},
    validation::{validate_algorithm, validate_kid},
};

/// Default tolerated clock skew when checking expiry.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// The authenticated principal.
///
/// An opaque, non-empty subject string taken from the verified `sub`
/// claim. Request-scoped; nothing downstream re-parses it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity from a non-empty subject string.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingClaim`] if the subject is empty.
    pub fn new(subject: impl Into<String>) -> Result<Self, AuthError> {
        let subject = subject.into();
        if subject.is_empty() {
            return Err(AuthError::missing_claim("sub"));
        }
        Ok(Self(subject))
    }

    /// The subject string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identity, returning the subject string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A successfully verified token.
#[derive(Clone, Debug)]
pub struct Verified {
    /// The authenticated principal from the `sub` claim.
    pub identity: Identity,
    /// The full verified claim set.
    pub claims: Claims,
}

/// Verifier configuration.
#[derive(Clone, Debug)]
pub struct VerifierConfig {
    /// Expected `iss` claim, matched exactly.
    pub issuer: String,
    /// Value the `aud` claim must contain.
    pub audience: String,
    /// Tolerated clock skew for the expiry check.
    pub clock_skew: Duration,
}

impl VerifierConfig {
    /// Creates a configuration with [`DEFAULT_CLOCK_SKEW`].
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self { issuer: issuer.into(), audience: audience.into(), clock_skew: DEFAULT_CLOCK_SKEW }
    }

    /// Overrides the clock-skew allowance.
    #[must_use]
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }
}

/// Deployment-specific claim check, run after all standard checks pass.
pub type ClaimCheck = Box<dyn Fn(&Claims) -> Result<(), String> + Send + Sync>;

/// Verifies bearer tokens against the issuer's published keys.
pub struct TokenVerifier {
    config: VerifierConfig,
    keys: Arc<KeyCache>,
    claim_check: Option<ClaimCheck>,
}

impl TokenVerifier {
    /// Creates a verifier over the given key cache.
    pub fn new(config: VerifierConfig, keys: Arc<KeyCache>) -> Self {
        Self { config, keys, claim_check: None }
    }

    /// Adds a deployment-specific claim check.
    ///
    /// The check runs last, after signature, issuer, audience, and expiry
    /// have all passed. A returned message surfaces as
    /// [`AuthError::ClaimRejected`].
    #[must_use]
    pub fn with_claim_check(
        mut self,
        check: impl Fn(&Claims) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.claim_check = Some(Box::new(check));
        self
    }

    /// Verifies a raw token.
    ///
    /// Checks run in a fixed order; the error identifies the first check
    /// that failed.
    ///
    /// # Errors
    ///
    /// See [`AuthError`]; every variant except `Timeout` can surface here.
    #[tracing::instrument(skip(self, token))]
    pub async fn verify(&self, token: &str) -> Result<Verified, AuthError> {
        let header = decode_token_header(token)?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::invalid_token_format("Token header missing 'kid' field"))?;
        validate_kid(&kid)?;

        let key = self.keys.get_key(&kid).await?;

        let alg = format!("{:?}", header.alg);
        validate_algorithm(&alg)?;

        // From here on the claims are signature-backed.
        let claims = verify_signature(token, &key, header.alg)?;

        if claims.iss != self.config.issuer {
            return Err(AuthError::invalid_issuer(format!(
                "expected '{}', got '{}'",
                self.config.issuer, claims.iss
            )));
        }

        let audience_ok =
            claims.aud.as_ref().is_some_and(|aud| aud.contains(&self.config.audience));
        if !audience_ok {
            return Err(AuthError::invalid_audience(format!(
                "token does not include audience '{}'",
                self.config.audience
            )));
        }

        let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
        let skew = self.config.clock_skew.as_secs();
        // Boundary inclusive: exp == now - skew still passes.
        if claims.exp.saturating_add(skew) < now {
            return Err(AuthError::token_expired());
        }

        if let Some(check) = &self.claim_check {
            check(&claims).map_err(AuthError::claim_rejected)?;
        }

        let identity = Identity::new(claims.sub.clone())?;
        tracing::debug!(subject = %identity, kid = %kid, "token verified");

        Ok(Verified { identity, claims })
    }
}
