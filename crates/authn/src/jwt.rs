//! Token decoding and claims.
//!
//! This module provides the claim model plus the low-level decode steps the
//! verifier composes: unverified header/claims extraction (needed to pick
//! the signing key) and signature verification proper.
//!
//! # Example
//!
//! ```no_run
//! // Requires a valid token string.
//! use journal_authn::jwt::{decode_claims, decode_token_header};
//!
//! # fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let header = decode_token_header(token)?;
//! let claims = decode_claims(token)?;
//!
//! println!("Algorithm: {:?}", header.alg);
//! println!("Subject: {}", claims.sub);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// The `aud` claim, which issuers publish either as a single string or as
/// an array of strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience value.
    Single(String),
    /// Multiple audience values.
    Multiple(Vec<String>),
}

impl Audience {
    /// Returns `true` if any audience value equals `expected`.
    #[must_use]
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Self::Single(aud) => aud == expected,
            Self::Multiple(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

/// Token claims.
///
/// The registered claims the verifier checks are typed; everything else the
/// issuer includes lands in `extra` and is available to deployment-specific
/// claim checks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer URL.
    pub iss: String,
    /// Subject - the authenticated principal.
    pub sub: String,
    /// Audience - the intended recipient(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    /// Expiration time (seconds since epoch).
    pub exp: u64,
    /// Issued at (optional, seconds since epoch).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Any additional claims the issuer included.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Decode a token header without verification.
///
/// # Errors
///
/// Returns an error if the token header cannot be decoded.
pub fn decode_token_header(token: &str) -> Result<Header, AuthError> {
    decode_header(token)
        .map_err(|e| AuthError::invalid_token_format(format!("Failed to decode header: {}", e)))
}

/// Decode token claims without verification.
///
/// Used to inspect claims before the signing key is resolved. Nothing
/// returned here may be trusted until [`verify_signature`] succeeds.
///
/// # Errors
///
/// Returns an error if:
/// - The token does not have exactly 3 parts
/// - The payload cannot be base64-decoded
/// - The payload cannot be parsed as JSON
/// - The `iss` or `sub` claim is empty
pub fn decode_claims(token: &str) -> Result<Claims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::invalid_token_format("Token must have 3 parts separated by dots"));
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| AuthError::invalid_token_format(format!("Failed to decode payload: {}", e)))?;

    let claims: Claims = serde_json::from_slice(&payload_bytes)
        .map_err(|e| AuthError::invalid_token_format(format!("Failed to parse claims: {}", e)))?;

    if claims.iss.is_empty() {
        return Err(AuthError::missing_claim("iss"));
    }
    if claims.sub.is_empty() {
        return Err(AuthError::missing_claim("sub"));
    }

    Ok(claims)
}

/// Verify a token signature with a public key.
///
/// Only the signature is checked here; issuer, audience, and expiry checks
/// live in the verifier so their ordering and skew handling stay in one
/// place.
///
/// # Errors
///
/// Returns [`AuthError::InvalidSignature`] if verification fails.
pub fn verify_signature(
    token: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = Default::default();

    let token_data = decode::<Claims>(token, key, &validation)?;

    Ok(token_data.claims)
}
