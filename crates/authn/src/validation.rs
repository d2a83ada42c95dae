//! Token algorithm and key ID validation.
//!
//! This module provides security checks applied before any signature
//! verification or key fetch happens.
//!
//! # Security
//!
//! - Strict algorithm checks to prevent algorithm substitution attacks
//! - Only one asymmetric algorithm (EdDSA) is allowed
//! - Symmetric algorithms and "none" are always rejected
//! - Key IDs are constrained to a safe character set before cache lookup

use crate::error::AuthError;

/// Forbidden token algorithms that are never accepted for security reasons.
///
/// These algorithms are blocked because:
/// - `none`: No signature verification (trivially bypassable)
/// - `HS256`, `HS384`, `HS512`: Symmetric algorithms (shared secret vulnerability)
pub const FORBIDDEN_ALGORITHMS: &[&str] = &["none", "HS256", "HS384", "HS512"];

/// Accepted token algorithms.
///
/// Currently only EdDSA (Ed25519) is supported end-to-end; the key set
/// loader in [`crate::jwks`] only materializes Ed25519 keys. Per RFC 8725
/// Section 3.1, validators must reject algorithms they do not fully
/// implement, so other asymmetric algorithms stay off this list until the
/// verification pipeline handles their key types.
pub const ACCEPTED_ALGORITHMS: &[&str] = &["EdDSA"];

/// Maximum accepted key ID length.
const MAX_KID_LENGTH: usize = 128;

/// Validate a token algorithm against security policies.
///
/// # Errors
///
/// Returns [`AuthError::UnsupportedAlgorithm`] if:
/// - Algorithm is symmetric (HS256, HS384, HS512)
/// - Algorithm is "none"
/// - Algorithm is not in [`ACCEPTED_ALGORITHMS`]
///
/// # Examples
///
/// ```
/// use journal_authn::validation::validate_algorithm;
///
/// assert!(validate_algorithm("EdDSA").is_ok());
/// assert!(validate_algorithm("HS256").is_err());
/// assert!(validate_algorithm("none").is_err());
/// ```
pub fn validate_algorithm(alg: &str) -> Result<(), AuthError> {
    if FORBIDDEN_ALGORITHMS.contains(&alg) {
        return Err(AuthError::unsupported_algorithm(format!(
            "Algorithm '{}' is not allowed for security reasons",
            alg
        )));
    }

    if !ACCEPTED_ALGORITHMS.contains(&alg) {
        return Err(AuthError::unsupported_algorithm(format!(
            "Algorithm '{}' is not in accepted list (only EdDSA is supported)",
            alg
        )));
    }

    Ok(())
}

/// Validate a key ID before it is used for cache lookup.
///
/// Key IDs come straight from an unverified token header, so the character
/// set is constrained before the value reaches logs or the key cache.
///
/// # Errors
///
/// Returns [`AuthError::InvalidTokenFormat`] if the key ID is empty, longer
/// than [`MAX_KID_LENGTH`] bytes, or contains characters outside
/// `[A-Za-z0-9._:-]`.
pub fn validate_kid(kid: &str) -> Result<(), AuthError> {
    if kid.is_empty() {
        return Err(AuthError::invalid_token_format("Key ID is empty"));
    }
    if kid.len() > MAX_KID_LENGTH {
        return Err(AuthError::invalid_token_format(format!(
            "Key ID exceeds {} bytes",
            MAX_KID_LENGTH
        )));
    }
    if !kid.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-')) {
        return Err(AuthError::invalid_token_format("Key ID contains invalid characters"));
    }
    Ok(())
}
