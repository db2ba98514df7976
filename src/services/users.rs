// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User management over the `users` collection.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::user::validate_username;
use crate::models::{NewUser, UserChanges, UserRecord, UserUpdate};
use crate::services::auth::PasswordHasher;
use std::sync::Arc;
use validator::Validate;

/// CRUD over dashboard users. Passwords are hashed before they reach the
/// database.
#[derive(Clone)]
pub struct UserStore {
    db: Arc<FirestoreDb>,
    hasher: PasswordHasher,
}

impl UserStore {
    pub fn new(db: Arc<FirestoreDb>, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }

    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    async fn to_record(&self, user: NewUser) -> Result<UserRecord, AppError> {
        user.validate()?;
        let password = self.hasher.hash(&user.password).await?;

        Ok(UserRecord {
            username: user.username,
            name: user.name,
            email: user.email,
            password: Some(password),
            is_admin: user.is_admin,
        })
    }

    /// Add a user, overwriting any existing user with the same username.
    pub async fn add_user(&self, user: NewUser) -> Result<UserRecord, AppError> {
        let record = self.to_record(user).await?;
        self.db.upsert_user(&record).await?;
        tracing::info!(username = %record.username, is_admin = record.is_admin, "User saved");
        Ok(record)
    }

    /// Add a user; fails with `DuplicateKey` if the username is taken.
    pub async fn create_user(&self, user: NewUser) -> Result<UserRecord, AppError> {
        let record = self.to_record(user).await?;
        self.db.insert_user(&record).await?;
        tracing::info!(username = %record.username, is_admin = record.is_admin, "User created");
        Ok(record)
    }

    /// Apply a partial update. A supplied password is re-hashed.
    ///
    /// Returns the record as stored after the update.
    pub async fn update_user(
        &self,
        username: &str,
        changes: UserChanges,
    ) -> Result<UserRecord, AppError> {
        if validate_username(username).is_err() {
            return Err(AppError::NotFound(format!("user {}", username)));
        }
        let changes = changes.normalized();
        changes.validate()?;

        let mut current = self
            .db
            .get_user(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;

        let password = match changes.password.as_deref() {
            Some(plain) => Some(self.hasher.hash(plain).await?),
            None => None,
        };

        let update = UserUpdate {
            name: changes.name,
            email: changes.email,
            password,
            is_admin: changes.is_admin,
        };

        self.db.update_user_fields(username, &update).await?;
        update.apply_to(&mut current);

        tracing::info!(username, fields = ?update.field_paths(), "User updated");
        Ok(current)
    }

    /// Delete a user. Missing users, and strings that cannot be usernames,
    /// are ignored.
    pub async fn remove_user(&self, username: &str) -> Result<(), AppError> {
        if validate_username(username).is_err() {
            return Ok(());
        }
        self.db.delete_user(username).await?;
        tracing::info!(username, "User removed");
        Ok(())
    }

    /// Snapshot of every user, in no particular order.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, AppError> {
        self.db.list_users().await
    }

    /// Point lookup. A string that cannot be a username finds nothing.
    pub async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        if validate_username(username).is_err() {
            return Ok(None);
        }
        self.db.get_user(username).await
    }
}
