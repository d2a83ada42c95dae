//! # Journal Service
//!
//! The authenticated record service: an [`AuthGate`] that turns bearer
//! tokens into typed identities (or structured 401 rejections), and a
//! [`RecordService`] that creates and lists journal records on behalf of
//! those identities.
//!
//! Transport, routing, and body codecs live outside this crate; it deals
//! in header values, identities, and records.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use journal_authn::{HttpKeySetFetcher, KeyCache, TokenVerifier, VerifierConfig};
//! use journal_service::{AuthGate, RecordService, ServiceConfig, UnauthenticatedPolicy};
//! use journal_storage::{KvRecordStore, MemoryBackend};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(authorization: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::from_env()?;
//!
//! let fetcher = HttpKeySetFetcher::new(config.effective_jwks_url())?;
//! let keys = Arc::new(KeyCache::with_refresh_interval(
//!     Arc::new(fetcher),
//!     config.key_refresh_interval(),
//! ));
//! let verifier = TokenVerifier::new(
//!     VerifierConfig::new(&config.issuer, &config.audience)
//!         .with_clock_skew(config.clock_skew()),
//!     keys,
//! );
//!
//! let gate = AuthGate::new(verifier, UnauthenticatedPolicy::Reject);
//! let backend = Arc::new(MemoryBackend::new());
//! let service = RecordService::new(Arc::new(KvRecordStore::new(backend, config.table)));
//!
//! let cancel = CancellationToken::new();
//! let identity = gate.authenticate(authorization, &cancel).await.map_err(|r| r.code)?;
//! let records = service.list(&identity, 50, &cancel).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Service configuration.
pub mod config;
/// Service error types.
pub mod error;
/// Request authentication gate.
pub mod gate;
/// Record operations.
pub mod service;

pub use config::{ConfigError, ServiceConfig};
pub use error::ServiceError;
pub use gate::{AuthGate, AuthRejection, UnauthenticatedPolicy};
pub use service::RecordService;
