//! Shared test utilities for authentication testing.
//!
//! This module provides helpers for generating Ed25519 key pairs, signing
//! test tokens, crafting raw token strings (for attack testing), and a
//! [`FakeIssuer`] that stands in for the issuer's published key endpoint.
//! It is feature-gated behind `testutil` to prevent leaking into
//! production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! journal-authn = { path = "../authn", features = ["testutil"] }
//! ```

use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use ed25519_dalek::SigningKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use rand_core::OsRng;
use serde_json::json;

use crate::{
    error::AuthError,
    jwks::{Jwk, JwkSet, KeySetFetcher},
};

/// Generates a test Ed25519 key pair.
///
/// Returns `(pkcs8_der, public_key_base64url)` where:
/// - `pkcs8_der` is the private key in PKCS#8 DER format (suitable for
///   [`EncodingKey::from_ed_der`])
/// - `public_key_base64url` is the 32-byte public key encoded as base64url
///   without padding (suitable for a published key's `x` member)
///
/// Each call generates a fresh random key pair.
pub fn generate_test_keypair() -> (Vec<u8>, String) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let public_key_bytes = signing_key.verifying_key().to_bytes();
    let public_key_b64 = URL_SAFE_NO_PAD.encode(public_key_bytes);

    let mut pkcs8_der = vec![
        0x30, 0x2e, // SEQUENCE, 46 bytes
        0x02, 0x01, 0x00, // INTEGER version 0
        0x30, 0x05, // SEQUENCE, 5 bytes (algorithm identifier)
        0x06, 0x03, 0x2b, 0x65, 0x70, // OID 1.3.101.112 (Ed25519)
        0x04, 0x22, // OCTET STRING, 34 bytes
        0x04, 0x20, // OCTET STRING, 32 bytes (the actual key)
    ];
    pkcs8_der.extend_from_slice(&signing_key.to_bytes());

    (pkcs8_der, public_key_b64)
}

/// Builds a published Ed25519 signing key entry.
pub fn test_jwk(kid: &str, public_key_b64: &str) -> Jwk {
    Jwk {
        kty: "OKP".into(),
        kid: kid.into(),
        alg: Some("EdDSA".into()),
        key_use: Some("sig".into()),
        crv: Some("Ed25519".into()),
        x: Some(public_key_b64.into()),
    }
}

/// Signs arbitrary claims with an Ed25519 key in PKCS#8 DER format.
///
/// The `kid` header is set so the verifier can look up the matching
/// public key.
///
/// # Panics
///
/// Panics if token encoding fails (should not happen with valid inputs).
pub fn sign_claims(pkcs8_der: &[u8], kid: &str, claims: &serde_json::Value) -> String {
    let mut header = Header::new(Algorithm::EdDSA);
    header.kid = Some(kid.to_string());

    let encoding_key = EncodingKey::from_ed_der(pkcs8_der);
    jsonwebtoken::encode(&header, claims, &encoding_key).expect("Failed to encode test token")
}

/// Creates a signed token with the standard claim set.
///
/// `exp_offset_secs` is added to the current time to form the `exp` claim;
/// negative offsets produce already-expired tokens.
///
/// # Panics
///
/// Panics if token encoding fails (should not happen with valid inputs).
pub fn create_signed_jwt(
    pkcs8_der: &[u8],
    kid: &str,
    issuer: &str,
    audience: &str,
    sub: &str,
    exp_offset_secs: i64,
) -> String {
    let now = Utc::now().timestamp();
    let claims = json!({
        "iss": issuer,
        "sub": sub,
        "aud": audience,
        "exp": now + exp_offset_secs,
        "iat": now,
    });
    sign_claims(pkcs8_der, kid, &claims)
}

/// Creates a raw token string from arbitrary header and payload JSON.
///
/// The resulting token has the structure `{header_b64}.{payload_b64}.`
/// with an empty signature. This is useful for testing rejection of
/// malformed or attack tokens (e.g., `alg: "none"`, algorithm confusion).
///
/// # Panics
///
/// Panics if JSON serialization fails.
pub fn craft_raw_jwt(header_json: &serde_json::Value, payload_json: &serde_json::Value) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header_json).expect("header json"));
    let payload_b64 =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload_json).expect("payload json"));
    format!("{header_b64}.{payload_b64}.")
}

/// In-memory stand-in for the issuer's published key endpoint.
///
/// Serves a settable [`JwkSet`], can be switched into a failing state to
/// exercise stale-serving, and counts fetches so tests can assert on
/// refresh behavior.
#[derive(Default)]
pub struct FakeIssuer {
    set: Mutex<JwkSet>,
    failing: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    fetches: AtomicUsize,
}

impl FakeIssuer {
    /// Creates an issuer publishing an empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an issuer publishing the given key set.
    #[must_use]
    pub fn with_keys(set: JwkSet) -> Self {
        Self { set: Mutex::new(set), ..Self::default() }
    }

    /// Replaces the published key set wholesale.
    pub fn set_keys(&self, set: JwkSet) {
        *self.set.lock() = set;
    }

    /// Makes subsequent fetches fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delays each fetch, to force overlap in concurrency tests.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    /// Number of fetches served so far, including failed ones.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetFetcher for FakeIssuer {
    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::key_fetch("fake issuer unavailable"));
        }
        Ok(self.set.lock().clone())
    }
}
