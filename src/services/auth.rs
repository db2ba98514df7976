// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and username/password login.
//!
//! Passwords are stored as bcrypt hashes; the hash string carries its own
//! salt and cost, so verification needs nothing else. bcrypt is CPU-bound,
//! so both directions run on the blocking pool.

use crate::error::AppError;
use crate::models::user::validate_username;
use crate::services::users::UserStore;

/// bcrypt with a fixed cost factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password with a fresh salt.
    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// A stored value that is not a bcrypt hash never matches.
    pub async fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let stored_hash = stored_hash.to_owned();

        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Verification task failed: {}", e)))?;

        match outcome {
            Ok(matches) => Ok(matches),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is not valid bcrypt");
                Ok(false)
            }
        }
    }
}

/// Validates username/password pairs against the user store.
#[derive(Clone)]
pub struct Authenticator {
    users: UserStore,
    hasher: PasswordHasher,
}

impl Authenticator {
    pub fn new(users: UserStore) -> Self {
        let hasher = users.hasher();
        Self { users, hasher }
    }

    /// True only if the user exists, has a hash, and the password matches.
    ///
    /// Unknown user and wrong password are indistinguishable to the caller.
    /// Database failures are errors, not `false`.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool, AppError> {
        // Not a possible document id, so no such user.
        if validate_username(username).is_err() {
            tracing::info!("Login rejected");
            return Ok(false);
        }

        let Some(user) = self.users.get_user(username).await? else {
            tracing::info!(username, "Login rejected");
            return Ok(false);
        };

        let Some(stored_hash) = user.password.as_deref().filter(|h| !h.is_empty()) else {
            tracing::info!(username, "Login rejected");
            return Ok(false);
        };

        let ok = self.hasher.verify(password, stored_hash).await?;
        if ok {
            tracing::info!(username, "Login succeeded");
        } else {
            tracing::info!(username, "Login rejected");
        }
        Ok(ok)
    }
}
