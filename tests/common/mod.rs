// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use regulator_dashboard::config::Config;
use regulator_dashboard::credentials::Credentials;
use regulator_dashboard::db::FirestoreDb;
use regulator_dashboard::models::{NewUser, SensorReading};
use regulator_dashboard::routes::create_router;
use regulator_dashboard::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    let credentials = Credentials::from_json(r#"{"project_id":"test-project"}"#, "test")
        .expect("Test credentials should parse");
    FirestoreDb::connect(&credentials)
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by the in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Arc::new(FirestoreDb::new_in_memory());
    let state = Arc::new(AppState::new(config, db));

    (create_router(state.clone()), state)
}

/// Add a user with a hashed password.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, username: &str, password: &str, is_admin: bool) {
    state
        .users
        .add_user(NewUser {
            username: username.to_string(),
            name: format!("{} Test", username),
            email: format!("{}@example.com", username),
            password: password.to_string(),
            is_admin,
        })
        .await
        .expect("Failed to seed user");
}

#[allow(dead_code)]
pub async fn seed_reading(state: &AppState, sensor: &str, timestamp: &str, pressure: f64) {
    state
        .db
        .add_reading(&SensorReading {
            sensor_id: sensor.to_string(),
            timestamp: timestamp.to_string(),
            pressure,
        })
        .await
        .expect("Failed to seed reading");
}

/// Log in through the API and return the `name=value` cookie pair.
#[allow(dead_code)]
pub async fn login_cookie(app: &axum::Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({ "username": username, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "login should succeed");

    set_cookie(&response)
        .split(';')
        .next()
        .unwrap()
        .trim()
        .to_string()
}

/// The `Set-Cookie` header of a response.
#[allow(dead_code)]
pub fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

#[allow(dead_code)]
pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
