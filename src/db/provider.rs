// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lazily-initialised, process-wide database handle.
//!
//! The first [`DatabaseProvider::get_database`] call resolves credentials and
//! connects; every later call returns the same `Arc`. Concurrent first calls
//! wait on a single initialisation. A failed initialisation is not cached,
//! so the next call tries again.

use crate::credentials::{CredentialResolver, Credentials};
use crate::db::FirestoreDb;
use crate::error::AppError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Builds a database client from credentials.
pub trait Connect: Send + Sync {
    fn connect(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<FirestoreDb, AppError>> + Send;
}

/// Connects to Firestore (or its emulator).
#[derive(Debug, Clone, Copy, Default)]
pub struct FirestoreConnector;

impl Connect for FirestoreConnector {
    async fn connect(&self, credentials: &Credentials) -> Result<FirestoreDb, AppError> {
        FirestoreDb::connect(credentials).await
    }
}

/// Owner of the shared database handle.
pub struct DatabaseProvider<C = FirestoreConnector> {
    resolver: CredentialResolver,
    connector: C,
    handle: OnceCell<Arc<FirestoreDb>>,
}

impl<C: Connect> DatabaseProvider<C> {
    pub fn new(resolver: CredentialResolver, connector: C) -> Self {
        Self {
            resolver,
            connector,
            handle: OnceCell::new(),
        }
    }

    /// Get the shared handle, connecting on first use.
    pub async fn get_database(&self) -> Result<Arc<FirestoreDb>, AppError> {
        let db = self
            .handle
            .get_or_try_init(|| async {
                let resolved = self.resolver.resolve_credentials()?;
                tracing::debug!(source = %resolved.source, "Initializing database handle");

                let db = self.connector.connect(&resolved.credentials).await.map_err(|e| match e {
                    AppError::Connection(_) => e,
                    other => AppError::Connection(other.to_string()),
                })?;

                Ok::<_, AppError>(Arc::new(db))
            })
            .await?;

        Ok(Arc::clone(db))
    }

    /// Whether the handle has been created yet.
    pub fn is_initialized(&self) -> bool {
        self.handle.initialized()
    }
}
