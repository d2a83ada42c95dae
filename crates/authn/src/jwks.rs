//! Published key set fetching and caching.
//!
//! The issuer publishes its signing keys as a JSON key set. [`KeyCache`]
//! holds the most recently fetched set and answers key-ID lookups for the
//! verifier:
//!
//! - The whole set is replaced atomically on refresh; readers observe
//!   either the previous or the new set in full, never a mix.
//! - A refresh runs when the cached set is older than the configured
//!   interval or when a lookup misses. Overlapping refresh attempts
//!   collapse into a single upstream fetch.
//! - When a refresh fails but a previously fetched set exists, the stale
//!   set keeps serving; the error is surfaced only when no set has ever
//!   been loaded.
//!
//! Fetching goes through the [`KeySetFetcher`] trait so tests can stand in
//! a fake issuer; [`HttpKeySetFetcher`] is the production implementation.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::AuthError;

/// Default maximum age of a cached key set before a lookup triggers a
/// refresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Timeout for a single key set fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One published signing key.
///
/// Only Ed25519 keys (`kty: "OKP"`, `crv: "Ed25519"`) are materialized;
/// other entries in a fetched set are skipped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type.
    pub kty: String,
    /// Key ID.
    pub kid: String,
    /// Algorithm, if published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Key use (sig, enc).
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Curve name for OKP keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// Public key material (base64url) for OKP keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
}

/// A published key set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JwkSet {
    /// The published keys.
    pub keys: Vec<Jwk>,
}

/// Source of published key sets.
///
/// Implementations fetch the issuer's current full key set; partial
/// updates do not exist in this model.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// Fetches the issuer's current key set.
    async fn fetch_keys(&self) -> Result<JwkSet, AuthError>;
}

/// [`KeySetFetcher`] that fetches the key set over HTTPS.
pub struct HttpKeySetFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySetFetcher {
    /// Creates a fetcher for the given key set URL.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyFetch`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::key_fetch_with_source("failed to build HTTP client", e))?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AuthError::key_fetch_with_source("failed to fetch key set", e))?;

        if !response.status().is_success() {
            return Err(AuthError::key_fetch(format!(
                "key set endpoint returned status {}",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::key_fetch_with_source("failed to parse key set", e))
    }
}

/// Converts a published key into a verification key.
///
/// # Errors
///
/// Returns [`AuthError::KeyFetch`] if the key is not an Ed25519 OKP key or
/// its material is malformed.
fn decoding_key_from_jwk(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    if jwk.kty != "OKP" {
        return Err(AuthError::key_fetch(format!("unsupported key type '{}'", jwk.kty)));
    }
    if jwk.crv.as_deref() != Some("Ed25519") {
        return Err(AuthError::key_fetch(format!(
            "unsupported curve '{}'",
            jwk.crv.as_deref().unwrap_or("<absent>")
        )));
    }
    let x = jwk.x.as_deref().ok_or_else(|| AuthError::key_fetch("OKP key missing 'x'"))?;

    DecodingKey::from_ed_components(x)
        .map_err(|e| AuthError::key_fetch_with_source("invalid Ed25519 key material", e))
}

/// Cache of the issuer's published verification keys.
///
/// The current set lives behind an [`Arc`] snapshot; a refresh builds the
/// replacement map off to the side and swaps the snapshot in one write, so
/// concurrent lookups never see a partially updated set.
pub struct KeyCache {
    fetcher: Arc<dyn KeySetFetcher>,
    keys: RwLock<Arc<HashMap<String, Arc<DecodingKey>>>>,
    fetched_at: RwLock<Option<Instant>>,
    refresh_interval: Duration,
    refresh_lock: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl KeyCache {
    /// Creates a cache with [`DEFAULT_REFRESH_INTERVAL`].
    ///
    /// No fetch happens here; the first lookup loads the initial set.
    pub fn new(fetcher: Arc<dyn KeySetFetcher>) -> Self {
        Self::with_refresh_interval(fetcher, DEFAULT_REFRESH_INTERVAL)
    }

    /// Creates a cache with a custom refresh interval.
    pub fn with_refresh_interval(fetcher: Arc<dyn KeySetFetcher>, interval: Duration) -> Self {
        Self {
            fetcher,
            keys: RwLock::new(Arc::new(HashMap::new())),
            fetched_at: RwLock::new(None),
            refresh_interval: interval,
            refresh_lock: tokio::sync::Mutex::new(()),
            cancel: CancellationToken::new(),
            refresh_task: Mutex::new(None),
        }
    }

    /// Returns the verification key for `kid`.
    ///
    /// A fresh cached set answers directly. A stale set or a missing `kid`
    /// triggers a refresh first; a `kid` still absent from the refreshed
    /// set is reported as unknown.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyNotFound`] if no published key carries this
    /// `kid`, or [`AuthError::KeyFetch`] if no set has ever been fetched
    /// and the fetch fails.
    #[tracing::instrument(skip(self))]
    pub async fn get_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if !self.is_stale() {
            if let Some(key) = self.keys.read().get(kid) {
                return Ok(key.clone());
            }
            tracing::debug!(kid = %kid, "key not in cached set, refreshing");
        }

        self.refresh().await?;

        self.keys.read().get(kid).cloned().ok_or_else(|| AuthError::key_not_found(kid))
    }

    /// Number of keys in the current set.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.read().len()
    }

    /// Whether the cached set is absent or older than the refresh interval.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        match *self.fetched_at.read() {
            Some(at) => at.elapsed() >= self.refresh_interval,
            None => true,
        }
    }

    /// Fetches the current key set and swaps it in.
    ///
    /// Concurrent callers collapse into a single upstream fetch: whoever
    /// holds the refresh lock fetches, everyone else waits and reuses the
    /// result. A failed fetch keeps the previous set in place.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyFetch`] only when the fetch fails and no
    /// previous set exists to keep serving.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let before = *self.fetched_at.read();
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have completed a fetch while we waited.
        if *self.fetched_at.read() != before {
            return Ok(());
        }

        let result = match self.fetcher.fetch_keys().await {
            Ok(set) => self.install(set),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if self.fetched_at.read().is_some() => {
                tracing::warn!(error = %e, "key set refresh failed, serving previous set");
                Ok(())
            },
            Err(e) => {
                tracing::error!(error = %e, "initial key set fetch failed");
                Err(e)
            },
        }
    }

    fn install(&self, set: JwkSet) -> Result<(), AuthError> {
        let mut new_keys = HashMap::with_capacity(set.keys.len());
        for jwk in &set.keys {
            if jwk.key_use.as_deref() == Some("enc") {
                continue;
            }
            match decoding_key_from_jwk(jwk) {
                Ok(key) => {
                    new_keys.insert(jwk.kid.clone(), Arc::new(key));
                },
                Err(e) => {
                    tracing::warn!(kid = %jwk.kid, kty = %jwk.kty, error = %e, "skipping unusable published key");
                },
            }
        }

        if new_keys.is_empty() {
            return Err(AuthError::key_fetch("key set contains no usable signing keys"));
        }

        // One pointer write replaces the whole set.
        *self.keys.write() = Arc::new(new_keys);
        *self.fetched_at.write() = Some(Instant::now());
        tracing::debug!(key_count = self.key_count(), "key set refreshed");
        Ok(())
    }

    /// Starts a background task refreshing the set every interval until
    /// [`shutdown`](Self::shutdown) is called.
    pub fn start_background_refresh(self: &Arc<Self>) {
        let cache = Arc::clone(self);
        let cancel = self.cancel.clone();
        let interval = self.refresh_interval;
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(interval) => {
                        if let Err(e) = cache.refresh().await {
                            tracing::warn!(error = %e, "background key set refresh failed");
                        }
                    },
                }
            }
        });
        *self.refresh_task.lock() = Some(handle);
    }

    /// Stops the background refresh task, if one is running, and waits for
    /// it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.refresh_task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
