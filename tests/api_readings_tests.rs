// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard readings API: overview, filtering, statistics and exports.
//!
//! Test config displays times in UTC+8.

use axum::http::{header, StatusCode};
use regulator_dashboard::time_utils::format_utc_rfc3339;
use regulator_dashboard::AppState;
use tower::ServiceExt;

mod common;
use common::{
    body_json, body_text, create_test_app, get_request, login_cookie, seed_reading, seed_user,
};

/// Seed a user plus a small set of readings and return (app, state, cookie).
async fn seeded_app() -> (axum::Router, std::sync::Arc<AppState>, String) {
    let (app, state) = create_test_app();
    seed_user(&state, "alice", "correct", false).await;

    // 08:00 on 1 May, UTC+8
    seed_reading(&state, "REG-01", "2024-05-01T00:00:00Z", 2.0).await;
    // 04:00 on 2 May, UTC+8
    seed_reading(&state, "REG-01", "2024-05-01T20:00:00Z", 4.0).await;
    // 23:30 on 30 April, UTC+8; naive timestamps are UTC
    seed_reading(&state, "REG-02", "2024-04-30T15:30:00", 3.0).await;
    // Unparsable, ignored
    seed_reading(&state, "REG-02", "yesterday", 99.0).await;
    seed_reading(&state, "REG-09", "not a time", 1.0).await;

    let cookie = login_cookie(&app, "alice", "correct").await;
    (app, state, cookie)
}

#[tokio::test]
async fn test_latest_reading_per_sensor() {
    let (app, state, cookie) = seeded_app().await;
    let now = format_utc_rfc3339(chrono::Utc::now());
    seed_reading(&state, "REG-03", &now, 1.5).await;

    let response = app
        .oneshot(get_request("/api/readings/latest", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let latest = body.as_array().unwrap();
    assert_eq!(latest.len(), 3);

    assert_eq!(latest[0]["sensor_id"], "REG-01");
    assert_eq!(latest[0]["pressure"], 4.0);
    assert_eq!(latest[0]["formatted_timestamp"], "02/05/2024 04:00");
    assert_eq!(latest[0]["is_stale"], true);

    assert_eq!(latest[1]["sensor_id"], "REG-02");
    assert_eq!(latest[1]["formatted_timestamp"], "30/04/2024 23:30");

    assert_eq!(latest[2]["sensor_id"], "REG-03");
    assert_eq!(latest[2]["is_stale"], false);
}

#[tokio::test]
async fn test_sensor_ids_are_sorted_and_distinct() {
    let (app, _, cookie) = seeded_app().await;

    let response = app
        .oneshot(get_request("/api/readings/sensors", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!(["REG-01", "REG-02"])
    );
}

#[tokio::test]
async fn test_date_filter_uses_display_days() {
    let (app, _, cookie) = seeded_app().await;

    let response = app
        .oneshot(get_request(
            "/api/readings?start=2024-05-01&end=2024-05-01",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["sensor_id"], "REG-01");
    assert_eq!(rows[0]["timestamp"], "2024-05-01T00:00:00Z");
    assert_eq!(rows[0]["formatted_timestamp"], "01/05/2024 08:00");
}

#[tokio::test]
async fn test_sensor_filter_and_all() {
    let (app, _, cookie) = seeded_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/readings?sensor=All", Some(&cookie)))
        .await
        .unwrap();
    let all = body_json(response).await;
    assert_eq!(all.as_array().unwrap().len(), 3);
    // Oldest first
    assert_eq!(all[0]["sensor_id"], "REG-02");

    let response = app
        .oneshot(get_request("/api/readings?sensor=REG-01", Some(&cookie)))
        .await
        .unwrap();
    let only = body_json(response).await;
    let rows = only.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["sensor_id"] == "REG-01"));
}

#[tokio::test]
async fn test_reversed_date_range_is_bad_request() {
    let (app, _, cookie) = seeded_app().await;

    let response = app
        .oneshot(get_request(
            "/api/readings?start=2024-05-02&end=2024-05-01",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_for_one_sensor() {
    let (app, _, cookie) = seeded_app().await;

    let response = app
        .oneshot(get_request("/api/readings/stats?sensor=REG-01", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stats = body_json(response).await;
    assert_eq!(stats["total_records"], 2);
    assert_eq!(stats["mean"], 3.0);
    assert_eq!(stats["median"], 3.0);
    let std_dev = stats["std_dev"].as_f64().unwrap();
    assert!((std_dev - std::f64::consts::SQRT_2).abs() < 1e-9);
}

#[tokio::test]
async fn test_stats_with_no_matches() {
    let (app, _, cookie) = seeded_app().await;

    let response = app
        .oneshot(get_request("/api/readings/stats?sensor=NOPE", Some(&cookie)))
        .await
        .unwrap();

    let stats = body_json(response).await;
    assert_eq!(stats["total_records"], 0);
    assert!(stats["mean"].is_null());
    assert!(stats["std_dev"].is_null());
}

#[tokio::test]
async fn test_csv_export() {
    let (app, _, cookie) = seeded_app().await;

    let response = app
        .oneshot(get_request(
            "/api/readings/export.csv?sensor=REG-01",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    assert!(response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("filtered_data.csv"));

    assert_eq!(
        body_text(response).await,
        "formatted_timestamp,sensorID,pressure\n\
         01/05/2024 08:00,REG-01,2\n\
         02/05/2024 04:00,REG-01,4\n"
    );
}

#[tokio::test]
async fn test_pdf_export() {
    let (app, _, cookie) = seeded_app().await;

    let response = app
        .oneshot(get_request(
            "/api/readings/export.pdf?sensor=REG-01",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert!(response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("filtered_data.pdf"));

    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    assert!(body.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_pdf_export_requires_session() {
    let (app, _, _) = seeded_app().await;

    let response = app
        .oneshot(get_request("/api/readings/export.pdf", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
