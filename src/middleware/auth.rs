// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "dashboard_session";

/// Authenticated user extracted from the session.
///
/// `is_admin` is read from the store on the same request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub is_admin: bool,
}

/// Middleware that requires an authenticated session for a user that still
/// exists. Sessions of deleted users are ended here.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    let username = state
        .sessions
        .authenticated_user(&state.gate, &session_id)
        .ok_or(AppError::Unauthorized)?;

    let Some(record) = state.users.get_user(&username).await? else {
        tracing::info!(username = %username, "Session user no longer exists");
        state.sessions.end(&state.gate, &session_id);
        return Err(AppError::Unauthorized);
    };

    request.extensions_mut().insert(AuthUser {
        username,
        is_admin: record.is_admin,
    });
    Ok(next.run(request).await)
}

/// Middleware that additionally requires the session user to be an admin.
///
/// Must run after [`require_session`], which re-reads the flag on every
/// request, so revoking admin takes effect immediately.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AppError::Unauthorized)?;

    if !user.is_admin {
        tracing::warn!(username = %user.username, "Non-admin attempted user management");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}
