// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, logout and session gating over HTTP.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without a live session
//! 2. A successful login issues a session cookie that unlocks them
//! 3. Logout and failed logins leave the client anonymous

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

mod common;
use common::{
    body_json, create_test_app, get_request, json_request, login_cookie, seed_user, set_cookie,
};

#[tokio::test]
async fn test_protected_route_without_session() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(get_request("/api/readings/latest", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_unknown_session() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(get_request(
            "/api/readings/latest",
            Some("dashboard_session=not-a-real-session"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let (app, state) = create_test_app();
    seed_user(&state, "alice", "correct", false).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({ "username": "alice", "password": "correct" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("dashboard_session="));
    assert!(cookie.contains("HttpOnly"));

    let body = body_json(response).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["username"], "alice");
    assert_eq!(state.sessions.len(), 1);
}

#[tokio::test]
async fn test_session_unlocks_protected_routes() {
    let (app, state) = create_test_app();
    seed_user(&state, "alice", "correct", false).await;
    let cookie = login_cookie(&app, "alice", "correct").await;

    let response = app
        .clone()
        .oneshot(get_request("/api/readings/latest", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request("/auth/session", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn test_failed_logins_all_look_the_same() {
    let (app, state) = create_test_app();
    seed_user(&state, "alice", "correct", false).await;

    let mut bodies = Vec::new();
    for (username, password) in [
        ("alice", "wrong"),
        ("ghost", "correct"),
        ("", "correct"),
        ("a/b", "correct"),
    ] {
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

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        bodies.push(body_json(response).await);
    }

    assert!(bodies.iter().all(|b| *b == bodies[0]));
    assert_eq!(bodies[0]["error"], "invalid_credentials");
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (app, state) = create_test_app();
    seed_user(&state, "alice", "correct", false).await;
    let cookie = login_cookie(&app, "alice", "correct").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let removal = set_cookie(&response);
    assert!(removal.starts_with("dashboard_session="));
    assert!(removal.contains("Max-Age=0"));
    assert!(state.sessions.is_empty());

    // The old cookie value no longer works.
    let response = app
        .clone()
        .oneshot(get_request("/api/readings/latest", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(get_request("/auth/session", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["authenticated"], false);
    assert!(body.get("username").is_none());
}

#[tokio::test]
async fn test_relogin_replaces_previous_session() {
    let (app, state) = create_test_app();
    seed_user(&state, "alice", "correct", false).await;
    let first = login_cookie(&app, "alice", "correct").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            Some(&first),
            serde_json::json!({ "username": "alice", "password": "correct" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = set_cookie(&response);

    assert_ne!(first, second.split(';').next().unwrap());
    assert_eq!(state.sessions.len(), 1);

    let response = app
        .oneshot(get_request("/api/readings/latest", Some(&first)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_responses_carry_hardening_headers() {
    let (app, _) = create_test_app();

    let response = app.oneshot(get_request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "in_memory");
}

#[tokio::test]
async fn test_cors_preflight_allows_frontend() {
    let (app, state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/auth/login")
                .header(header::ORIGIN, state.config.frontend_url.as_str())
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        state.config.frontend_url.as_str()
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}
