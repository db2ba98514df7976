// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Regulator Dashboard API Server
//!
//! Resolves Firestore credentials, connects once, and serves the login,
//! readings and user-management API.

use regulator_dashboard::{
    config::Config,
    credentials::CredentialResolver,
    db::{DatabaseProvider, FirestoreConnector, FirestoreDb},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often idle sessions are swept from memory.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;
    tracing::info!(port = config.port, "Starting Regulator Dashboard API");

    // DASHBOARD_IN_MEMORY=1 runs without Firestore (local UI work).
    let db = if std::env::var("DASHBOARD_IN_MEMORY").is_ok_and(|v| v == "1") {
        tracing::warn!("Using in-memory database; data is lost on exit");
        Arc::new(FirestoreDb::new_in_memory())
    } else {
        let provider =
            DatabaseProvider::new(CredentialResolver::from_config(&config), FirestoreConnector);
        // Connect eagerly so bad credentials abort startup instead of
        // failing the first request.
        provider.get_database().await.map_err(|e| {
            tracing::error!(error = %e, "Cannot start without a database connection");
            e
        })?
    };

    let state = Arc::new(AppState::new(config.clone(), db));

    spawn_session_sweeper(state.clone());

    let app = regulator_dashboard::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically drop expired sessions so abandoned logins do not pile up.
fn spawn_session_sweeper(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = state
                .sessions
                .purge_expired(&state.gate, chrono::Utc::now());
            if removed > 0 {
                tracing::debug!(removed, remaining = state.sessions.len(), "Swept idle sessions");
            }
        }
    });
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("regulator_dashboard=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
