//! User model for storage and API.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// User document stored in the `users` collection.
///
/// The username is the document id, so it is not written as a field;
/// Firestore fills it back in through `_firestore_id` on reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// bcrypt hash (never plaintext)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// Partial update. Only `Some` fields are written.
///
/// `password` here is already hashed; see [`crate::services::UserStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

impl UserUpdate {
    /// Document field paths touched by this update.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.email.is_some() {
            fields.push("email");
        }
        if self.password.is_some() {
            fields.push("password");
        }
        if self.is_admin.is_some() {
            fields.push("is_admin");
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    /// Apply to an in-memory record.
    pub fn apply_to(&self, record: &mut UserRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(email) = &self.email {
            record.email = email.clone();
        }
        if let Some(password) = &self.password {
            record.password = Some(password.clone());
        }
        if let Some(is_admin) = self.is_admin {
            record.is_admin = is_admin;
        }
    }
}

/// Request body for creating (or upserting) a user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Request body for a partial user update.
///
/// Empty strings count as "not supplied", matching the admin form which
/// submits blank password fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserChanges {
    #[validate(length(max = 128))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "validate_password"))]
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

impl UserChanges {
    pub fn normalized(self) -> Self {
        fn non_empty(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.is_empty())
        }
        Self {
            name: non_empty(self.name),
            email: non_empty(self.email),
            password: non_empty(self.password),
            is_admin: self.is_admin,
        }
    }
}

/// User as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        Self {
            username: record.username,
            name: record.name,
            email: record.email,
            is_admin: record.is_admin,
        }
    }
}

/// bcrypt only reads the first 72 bytes; anything longer would be
/// silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Passwords must be non-empty and fit in [`MAX_PASSWORD_BYTES`] bytes.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() || password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::new("password"));
    }
    Ok(())
}

/// Usernames are document ids: 1-64 chars of `[A-Za-z0-9_.-]`, not `.`/`..`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    let only_dots = username.chars().all(|c| c == '.');

    if username.is_empty() || username.len() > 64 || !valid_chars || only_dots {
        return Err(ValidationError::new("username"));
    }
    Ok(())
}
