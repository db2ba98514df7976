// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Regulator dashboard backend.
//!
//! Authenticates dashboard users against a Firestore `users` collection and
//! serves IoT gateway pressure readings (latest values, filtered history,
//! statistics and CSV export) to logged-in sessions.

pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{
    Authenticator, PasswordHasher, ReadingsService, SessionGate, SessionStore, UserStore,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<FirestoreDb>,
    pub users: UserStore,
    pub gate: SessionGate,
    pub sessions: SessionStore,
    pub readings: ReadingsService,
}

impl AppState {
    /// Wire every service to one database handle.
    pub fn new(config: Config, db: Arc<FirestoreDb>) -> Self {
        let users = UserStore::new(db.clone(), PasswordHasher::new(config.bcrypt_cost));
        let gate = SessionGate::new(
            Authenticator::new(users.clone()),
            config.session_idle_timeout,
        );
        let readings = ReadingsService::new(db.clone(), &config);

        Self {
            config,
            db,
            users,
            gate,
            sessions: SessionStore::new(),
            readings,
        }
    }
}
