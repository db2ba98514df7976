// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User management routes (admin only).
//!
//! The session and admin middleware are applied in routes/mod.rs.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{NewUser, UserChanges, UserProfile};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{username}",
            get(get_user)
                .put(upsert_user)
                .patch(update_user)
                .delete(remove_user),
        )
}

/// Body for `PUT /api/users/{username}`; the username comes from the path.
#[derive(Deserialize)]
pub struct UpsertUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// All users, sorted by username.
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserProfile>>> {
    let mut users: Vec<UserProfile> = state
        .users
        .list_users()
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();
    users.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(Json(users))
}

/// Create a user; 409 if the username exists.
async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<UserProfile>)> {
    tracing::info!(admin = %admin.username, username = %body.username, "Admin creating user");
    let record = state.users.create_user(body).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>> {
    let record = state
        .users
        .get_user(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;
    Ok(Json(record.into()))
}

/// Create or replace a user.
async fn upsert_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(username): Path<String>,
    Json(body): Json<UpsertUserRequest>,
) -> Result<Json<UserProfile>> {
    tracing::info!(admin = %admin.username, username = %username, "Admin saving user");
    let record = state
        .users
        .add_user(NewUser {
            username,
            name: body.name,
            email: body.email,
            password: body.password,
            is_admin: body.is_admin,
        })
        .await?;
    Ok(Json(record.into()))
}

/// Partial update; blank fields are left unchanged.
async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(username): Path<String>,
    Json(changes): Json<UserChanges>,
) -> Result<Json<UserProfile>> {
    tracing::info!(admin = %admin.username, username = %username, "Admin updating user");
    let record = state.users.update_user(&username, changes).await?;
    Ok(Json(record.into()))
}

/// Delete a user. Succeeds even if the user is already gone.
async fn remove_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<StatusCode> {
    tracing::info!(admin = %admin.username, username = %username, "Admin removing user");
    state.users.remove_user(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}
