//! # Journal Authentication
//!
//! Bearer token verification against issuer-published key sets.
//!
//! This crate provides:
//! - **Key cache**: background-refreshed cache of the issuer's published
//!   verification keys, with atomic full-set replacement, single-flight
//!   refresh, and stale-serving through upstream outages
//! - **Token verification**: a fixed-order check pipeline (structure, key,
//!   algorithm, signature, issuer, audience, expiry with skew, custom
//!   claim check) returning a typed [`Identity`]
//! - **Algorithm validation**: only one asymmetric algorithm (EdDSA) is
//!   accepted; symmetric algorithms and "none" are always rejected
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use journal_authn::{HttpKeySetFetcher, KeyCache, TokenVerifier, VerifierConfig};
//!
//! # async fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpKeySetFetcher::new("https://issuer.example.com/.well-known/jwks.json")?;
//! let keys = Arc::new(KeyCache::new(Arc::new(fetcher)));
//!
//! let config = VerifierConfig::new("https://issuer.example.com/", "api://journal");
//! let verifier = TokenVerifier::new(config, keys);
//!
//! let verified = verifier.verify(token).await?;
//! println!("authenticated: {}", verified.identity);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Authentication error types.
pub mod error;
/// Published key set fetching and caching.
pub mod jwks;
/// Token decoding and claims.
pub mod jwt;
/// Test helpers: key generation, token crafting, fake issuer.
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
/// Algorithm and key ID validation.
pub mod validation;
/// Token verification pipeline.
pub mod verifier;

// Re-export key types for convenience
pub use error::{AuthError, Result};
pub use jwks::{DEFAULT_REFRESH_INTERVAL, HttpKeySetFetcher, Jwk, JwkSet, KeyCache, KeySetFetcher};
pub use jwt::{Audience, Claims};
pub use validation::{ACCEPTED_ALGORITHMS, FORBIDDEN_ALGORITHMS, validate_algorithm};
pub use verifier::{DEFAULT_CLOCK_SKEW, Identity, TokenVerifier, Verified, VerifierConfig};
