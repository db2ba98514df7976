// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Database credentials are not part of this struct; they are resolved
//! separately by [`crate::credentials::CredentialResolver`] so that the
//! payload never ends up in a `Debug` dump of the config.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default location of the secret-store file (credential source A).
pub const DEFAULT_SECRETS_PATH: &str = "secrets.toml";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL (CORS origin)
    pub frontend_url: String,
    /// Secret-store file consulted before the environment
    pub secrets_path: PathBuf,
    /// bcrypt cost factor
    pub bcrypt_cost: u32,
    /// Idle timeout for authenticated sessions, `None` disables expiry
    pub session_idle_timeout: Option<chrono::Duration>,
    /// A sensor's latest reading older than this is flagged stale
    pub stale_reading_after: chrono::Duration,
    /// Offset used for date filters and formatted timestamps
    pub display_offset: chrono::FixedOffset,
}

impl Config {
    /// Settings for tests: cheap hashing, no disk secrets, short timeouts.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            secrets_path: PathBuf::from("does-not-exist/secrets.toml"),
            bcrypt_cost: 4,
            session_idle_timeout: Some(chrono::Duration::minutes(30)),
            stale_reading_after: chrono::Duration::minutes(5),
            display_offset: singapore_offset(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let idle_minutes: i64 = parse_var("SESSION_IDLE_TIMEOUT_MINUTES", 30)?;
        let offset_minutes: i32 = parse_var("DISPLAY_UTC_OFFSET_MINUTES", 8 * 60)?;

        let bcrypt_cost: u32 = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid("BCRYPT_COST"));
        }

        Ok(Self {
            port: parse_var("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            secrets_path: env::var("SECRETS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SECRETS_PATH)),
            bcrypt_cost,
            session_idle_timeout: match idle_minutes {
                0 => None,
                m if m > 0 => Some(chrono::Duration::minutes(m)),
                _ => return Err(ConfigError::Invalid("SESSION_IDLE_TIMEOUT_MINUTES")),
            },
            stale_reading_after: chrono::Duration::minutes(parse_var(
                "STALE_READING_MINUTES",
                5,
            )?),
            display_offset: chrono::FixedOffset::east_opt(offset_minutes * 60)
                .ok_or(ConfigError::Invalid("DISPLAY_UTC_OFFSET_MINUTES"))?,
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

fn singapore_offset() -> chrono::FixedOffset {
    chrono::FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid offset")
}

/// Read an optional env var, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("credentials not found")]
    CredentialsNotFound,

    #[error("malformed credentials (source={origin}): {reason}")]
    MalformedCredentials { origin: String, reason: String },
}
