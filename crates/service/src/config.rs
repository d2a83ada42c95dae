//! Service configuration.
//!
//! Configuration is resolved once at startup; a missing or invalid
//! required value is fatal there, never a per-request degradation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default key set refresh interval in seconds.
const DEFAULT_KEY_REFRESH_SECS: u64 = 300;

/// Default clock-skew allowance in seconds.
const DEFAULT_CLOCK_SKEW_SECS: u64 = 60;

/// Default logical table name for records.
const DEFAULT_TABLE: &str = "records";

/// Configuration errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("Missing required configuration: {0}")]
    MissingVar(String),

    /// A configuration value failed validation.
    #[error("Invalid configuration for {name}: {message}")]
    Invalid {
        /// The offending setting.
        name: String,
        /// What is wrong with it.
        message: String,
    },
}

impl ConfigError {
    fn missing(name: impl Into<String>) -> Self {
        Self::MissingVar(name.into())
    }

    fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid { name: name.into(), message: message.into() }
    }
}

/// Service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Token issuer URL, matched exactly against the `iss` claim.
    pub issuer: String,
    /// Audience the `aud` claim must contain.
    pub audience: String,
    /// Logical table name for records.
    #[serde(default = "default_table")]
    pub table: String,
    /// Published key set URL. Defaults to the issuer's well-known path.
    #[serde(default)]
    pub jwks_url: Option<String>,
    /// Maximum cached key set age before refresh, in seconds.
    #[serde(default = "default_key_refresh_secs")]
    pub key_refresh_secs: u64,
    /// Tolerated clock skew for expiry checks, in seconds.
    #[serde(default = "default_clock_skew_secs")]
    pub clock_skew_secs: u64,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_key_refresh_secs() -> u64 {
    DEFAULT_KEY_REFRESH_SECS
}

fn default_clock_skew_secs() -> u64 {
    DEFAULT_CLOCK_SKEW_SECS
}

impl ServiceConfig {
    /// Creates a configuration with defaults for everything but the
    /// required issuer and audience.
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            table: default_table(),
            jwks_url: None,
            key_refresh_secs: DEFAULT_KEY_REFRESH_SECS,
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
        }
    }

    /// Loads configuration from `JOURNAL_*` environment variables.
    ///
    /// `JOURNAL_ISSUER` and `JOURNAL_AUDIENCE` are required; everything
    /// else falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is absent or a
    /// value fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        let issuer =
            std::env::var("JOURNAL_ISSUER").map_err(|_| ConfigError::missing("JOURNAL_ISSUER"))?;
        let audience = std::env::var("JOURNAL_AUDIENCE")
            .map_err(|_| ConfigError::missing("JOURNAL_AUDIENCE"))?;

        let mut config = Self::new(issuer, audience);
        if let Ok(table) = std::env::var("JOURNAL_TABLE") {
            config.table = table;
        }
        if let Ok(url) = std::env::var("JOURNAL_JWKS_URL") {
            config.jwks_url = Some(url);
        }
        if let Ok(secs) = std::env::var("JOURNAL_KEY_REFRESH_SECS") {
            config.key_refresh_secs = secs.parse().map_err(|_| {
                ConfigError::invalid("JOURNAL_KEY_REFRESH_SECS", "must be an integer")
            })?;
        }
        if let Ok(secs) = std::env::var("JOURNAL_CLOCK_SKEW_SECS") {
            config.clock_skew_secs = secs
                .parse()
                .map_err(|_| ConfigError::invalid("JOURNAL_CLOCK_SKEW_SECS", "must be an integer"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty issuer, audience, or
    /// table, a non-HTTP issuer, or a zero refresh interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::invalid("issuer", "must not be empty"));
        }
        if !self.issuer.starts_with("https://") && !self.issuer.starts_with("http://") {
            return Err(ConfigError::invalid("issuer", "must be an HTTP(S) URL"));
        }
        if self.audience.is_empty() {
            return Err(ConfigError::invalid("audience", "must not be empty"));
        }
        if self.table.is_empty() {
            return Err(ConfigError::invalid("table", "must not be empty"));
        }
        if self.key_refresh_secs == 0 {
            return Err(ConfigError::invalid("key_refresh_secs", "must be positive"));
        }
        Ok(())
    }

    /// The effective key set URL: the configured one, or the issuer's
    /// well-known path.
    #[must_use]
    pub fn effective_jwks_url(&self) -> String {
        match &self.jwks_url {
            Some(url) => url.clone(),
            None => format!("{}/.well-known/jwks.json", self.issuer.trim_end_matches('/')),
        }
    }

    /// Key set refresh interval as a [`Duration`].
    #[must_use]
    pub fn key_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.key_refresh_secs)
    }

    /// Clock-skew allowance as a [`Duration`].
    #[must_use]
    pub fn clock_skew(&self) -> Duration {
        Duration::from_secs(self.clock_skew_secs)
    }
}
