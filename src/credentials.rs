// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database credential resolution.
//!
//! Credentials are a Google service-account JSON document. They are looked
//! up in an ordered list of [`SecretSource`]s; the first source that yields a
//! non-empty value wins:
//!
//! 1. the secret-store file, key `firebase.FIRESTORE_JSON` (or
//!    `firebase.credentials`)
//! 2. the `FIRESTORE_JSON` environment variable
//!
//! The payload itself is never logged. Parse errors only report the error
//! category and position, since serde messages can quote input.

use crate::config::{Config, ConfigError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the credential JSON.
pub const CREDENTIALS_ENV_VAR: &str = "FIRESTORE_JSON";

/// Service-account descriptor used to authenticate to Firestore.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub project_id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Issuer metadata (`auth_uri`, `token_uri`, ...) kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Credentials {
    /// Parse a credential payload. `origin` only feeds error messages.
    pub fn from_json(payload: &str, origin: &str) -> Result<Self, ConfigError> {
        let credentials: Credentials =
            serde_json::from_str(payload).map_err(|e| ConfigError::MalformedCredentials {
                origin: origin.to_string(),
                reason: format!(
                    "{:?} error at line {} column {}",
                    e.classify(),
                    e.line(),
                    e.column()
                ),
            })?;

        if credentials.project_id.trim().is_empty() {
            return Err(ConfigError::MalformedCredentials {
                origin: origin.to_string(),
                reason: "empty project_id".to_string(),
            });
        }

        Ok(credentials)
    }

    /// Serialize back to the service-account JSON format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// True when the descriptor carries key material (as opposed to a bare
    /// project id, which is enough for the emulator).
    pub fn has_key_material(&self) -> bool {
        self.private_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("project_id", &self.project_id)
            .field("account_type", &self.account_type)
            .field("client_email", &self.client_email)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Credentials together with the source that supplied them.
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    pub credentials: Credentials,
    pub source: String,
}

/// One place credentials may be stored.
pub trait SecretSource: Send + Sync {
    /// Human-readable name, used in logs and error messages.
    fn describe(&self) -> String;

    /// The raw payload, or `None` if this source has nothing.
    fn lookup(&self) -> Option<String>;
}

/// TOML secret-store file with a `[firebase]` table.
pub struct SecretsFileSource {
    path: PathBuf,
}

impl SecretsFileSource {
    /// Keys tried inside `[firebase]`, in order.
    const KEYS: [&'static str; 2] = ["FIRESTORE_JSON", "credentials"];

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn extract(table: &toml::Table) -> Option<String> {
        let firebase = table.get("firebase")?.as_table()?;
        Self::KEYS.iter().find_map(|key| match firebase.get(*key)? {
            toml::Value::String(s) => Some(s.clone()),
            // An inline table is the JSON document spelled out in TOML.
            toml::Value::Table(t) => serde_json::to_string(t).ok(),
            _ => None,
        })
    }
}

impl SecretSource for SecretsFileSource {
    fn describe(&self) -> String {
        format!("secrets file {}", self.path.display())
    }

    fn lookup(&self) -> Option<String> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Secrets file unreadable, skipping");
                return None;
            }
        };

        match contents.parse::<toml::Table>() {
            Ok(table) => Self::extract(&table),
            Err(_) => {
                tracing::warn!(path = %self.path.display(), "Secrets file is not valid TOML, skipping");
                None
            }
        }
    }
}

/// A single environment variable.
pub struct EnvVarSource {
    name: String,
}

impl EnvVarSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SecretSource for EnvVarSource {
    fn describe(&self) -> String {
        format!("environment variable {}", self.name)
    }

    fn lookup(&self) -> Option<String> {
        std::env::var(&self.name).ok()
    }
}

/// Resolves credentials from an ordered list of sources.
pub struct CredentialResolver {
    sources: Vec<Box<dyn SecretSource>>,
}

impl CredentialResolver {
    pub fn new(sources: Vec<Box<dyn SecretSource>>) -> Self {
        Self { sources }
    }

    /// Standard lookup order: secrets file, then environment.
    pub fn from_config(config: &Config) -> Self {
        Self::new(vec![
            Box::new(SecretsFileSource::new(config.secrets_path.clone())),
            Box::new(EnvVarSource::new(CREDENTIALS_ENV_VAR)),
        ])
    }

    /// Find the first non-empty payload and parse it.
    ///
    /// A malformed payload is an error even if a later source would have
    /// produced valid credentials.
    pub fn resolve_credentials(&self) -> Result<ResolvedCredentials, ConfigError> {
        for source in &self.sources {
            let Some(payload) = source.lookup() else {
                continue;
            };
            if payload.trim().is_empty() {
                continue;
            }

            let origin = source.describe();
            let credentials = Credentials::from_json(&payload, &origin)?;
            tracing::info!(
                source = %origin,
                project = %credentials.project_id,
                "Resolved database credentials"
            );

            return Ok(ResolvedCredentials {
                credentials,
                source: origin,
            });
        }

        Err(ConfigError::CredentialsNotFound)
    }
}
