// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, logout and session status.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::SESSION_COOKIE;
use crate::services::Session;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session_status))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Build the session cookie. No Max-Age: it lives as long as the browser
/// session, and idle expiry is enforced server-side.
fn session_cookie(id: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Check username/password and start a new session.
///
/// Any session presented with the request is ended first, and a fresh id is
/// issued on success.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    if let Some(previous) = jar.get(SESSION_COOKIE) {
        state.sessions.end(&state.gate, previous.value());
    }

    let mut session = Session::new();
    let ok = state
        .gate
        .authenticate_and_start_session(&mut session, &body.username, &body.password)
        .await?;
    if !ok {
        return Err(AppError::InvalidCredentials);
    }

    let id = state.sessions.insert(session)?;
    let jar = jar.add(session_cookie(id, state.config.secure_cookies()));

    Ok((
        jar,
        Json(SessionResponse {
            authenticated: true,
            username: Some(body.username),
        }),
    ))
}

/// End the current session (if any) and clear the cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.end(&state.gate, cookie.value());
    }

    let removal = Cookie::build(SESSION_COOKIE)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies());

    (jar.remove(removal), StatusCode::NO_CONTENT)
}

/// Whether the presented session is logged in.
async fn session_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Json<SessionResponse> {
    let username = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.authenticated_user(&state.gate, cookie.value()));

    Json(SessionResponse {
        authenticated: username.is_some(),
        username,
    })
}
