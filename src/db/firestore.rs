// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (dashboard accounts, keyed by username)
//! - IoT gateway readings (read by the dashboard pages)
//!
//! An in-memory backend implements the same operations for tests and for
//! running the dashboard without a Firestore project.

use crate::credentials::Credentials;
use crate::db::collections;
use crate::error::AppError;
use crate::models::{SensorReading, UserRecord, UserUpdate};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

impl std::fmt::Debug for FirestoreDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match &self.backend {
            Backend::Remote(_) => "firestore",
            Backend::Memory(_) => "in_memory",
        };
        f.debug_struct("FirestoreDb").field("backend", &backend).finish()
    }
}

#[derive(Clone)]
enum Backend {
    Remote(firestore::FirestoreDb),
    Memory(Arc<MemoryCollections>),
}

#[derive(Default)]
struct MemoryCollections {
    users: DashMap<String, UserRecord>,
    readings: RwLock<Vec<SensorReading>>,
}

impl FirestoreDb {
    /// Connect using service-account credentials.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST;
    /// only the credential's project id is used in that case.
    pub async fn connect(credentials: &Credentials) -> Result<Self, AppError> {
        let project_id = credentials.project_id.as_str();

        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let token_source = if credentials.has_key_material() {
            let json = credentials
                .to_json()
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode credentials: {}", e)))?;
            gcloud_sdk::TokenSourceType::Json(json)
        } else {
            // Bare project id: fall back to ambient application-default credentials.
            gcloud_sdk::TokenSourceType::Default
        };

        let client = firestore::FirestoreDb::with_options_token_source(
            firestore::FirestoreDbOptions::new(project_id.to_string()),
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            token_source,
        )
        .await
        .map_err(|e| AppError::Connection(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Remote(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let client = firestore::FirestoreDb::with_options_token_source(
            firestore::FirestoreDbOptions::new(project_id.to_string()),
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Connection(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Remote(client),
        })
    }

    /// Create an empty in-memory database.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::default()),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.backend, Backend::Memory(_))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by username.
    pub async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.users.get(username).map(|r| r.value().clone())),
            Backend::Remote(client) => {
                let record: Option<UserRecord> = client
                    .fluent()
                    .select()
                    .by_id_in(collections::USERS)
                    .obj()
                    .one(username)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                // The document id is authoritative for the username.
                Ok(record.map(|mut r| {
                    r.username = username.to_string();
                    r
                }))
            }
        }
    }

    /// Create or overwrite a user.
    pub async fn upsert_user(&self, user: &UserRecord) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => {
                mem.users.insert(user.username.clone(), user.clone());
            }
            Backend::Remote(client) => {
                let _: UserRecord = client
                    .fluent()
                    .update()
                    .in_col(collections::USERS)
                    .document_id(&user.username)
                    .object(user)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Create a user, failing if the username is taken.
    pub async fn insert_user(&self, user: &UserRecord) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => match mem.users.entry(user.username.clone()) {
                dashmap::mapref::entry::Entry::Occupied(_) => {
                    return Err(AppError::DuplicateKey(format!("user {}", user.username)))
                }
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(user.clone());
                }
            },
            Backend::Remote(client) => {
                let result: Result<UserRecord, _> = client
                    .fluent()
                    .insert()
                    .into(collections::USERS)
                    .document_id(&user.username)
                    .object(user)
                    .execute()
                    .await;

                match result {
                    Ok(_) => {}
                    Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                        return Err(AppError::DuplicateKey(format!("user {}", user.username)))
                    }
                    Err(e) => return Err(AppError::Database(e.to_string())),
                }
            }
        }
        Ok(())
    }

    /// Write only the fields present in `update`.
    ///
    /// The write requires the document to exist; a field-mask update would
    /// otherwise create a partial user. A missing user is `NotFound`.
    pub async fn update_user_fields(
        &self,
        username: &str,
        update: &UserUpdate,
    ) -> Result<(), AppError> {
        if update.is_empty() {
            return Ok(());
        }

        match &self.backend {
            Backend::Memory(mem) => {
                let mut record = mem
                    .users
                    .get_mut(username)
                    .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;
                update.apply_to(&mut record);
            }
            Backend::Remote(client) => {
                let result: Result<UserUpdate, _> = client
                    .fluent()
                    .update()
                    .fields(update.field_paths())
                    .in_col(collections::USERS)
                    .precondition(firestore::FirestoreWritePrecondition::Exists(true))
                    .document_id(username)
                    .object(update)
                    .execute()
                    .await;

                match result {
                    Ok(_) => {}
                    Err(firestore::errors::FirestoreError::DataNotFoundError(_)) => {
                        return Err(AppError::NotFound(format!("user {}", username)))
                    }
                    Err(e) => return Err(AppError::Database(e.to_string())),
                }
            }
        }
        Ok(())
    }

    /// Delete a user. Deleting a missing user is not an error.
    pub async fn delete_user(&self, username: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => {
                mem.users.remove(username);
            }
            Backend::Remote(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collections::USERS)
                    .document_id(username)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Every user document. Full collection scan, no pagination.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.users.iter().map(|r| r.value().clone()).collect()),
            Backend::Remote(client) => client
                .fluent()
                .select()
                .from(collections::USERS)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
        }
    }

    // ─── Reading Operations ──────────────────────────────────────

    /// Every gateway reading, unordered.
    pub async fn list_readings(&self) -> Result<Vec<SensorReading>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.readings.read().await.clone()),
            Backend::Remote(client) => client
                .fluent()
                .select()
                .from(collections::IOT_GATEWAY_READINGS)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
        }
    }

    /// Store a reading under a generated document id.
    ///
    /// The dashboard itself never writes readings; gateways do. This exists
    /// for seeding the emulator and the in-memory backend.
    pub async fn add_reading(&self, reading: &SensorReading) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.readings.write().await.push(reading.clone()),
            Backend::Remote(client) => {
                let _: SensorReading = client
                    .fluent()
                    .insert()
                    .into(collections::IOT_GATEWAY_READINGS)
                    .generate_document_id()
                    .object(reading)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }
        Ok(())
    }
}
