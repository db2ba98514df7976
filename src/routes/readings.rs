// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard data routes (require a logged-in session).

use crate::error::Result;
use crate::models::{LatestReading, PressureStats, ReadingFilter, ReadingRow};
use crate::services::export::{readings_to_csv, readings_to_pdf};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/readings", get(list_readings))
        .route("/api/readings/latest", get(latest_readings))
        .route("/api/readings/sensors", get(sensor_ids))
        .route("/api/readings/stats", get(reading_stats))
        .route("/api/readings/export.csv", get(export_csv))
        .route("/api/readings/export.pdf", get(export_pdf))
}

/// Latest value per sensor with a staleness flag.
async fn latest_readings(State(state): State<Arc<AppState>>) -> Result<Json<Vec<LatestReading>>> {
    Ok(Json(state.readings.latest(chrono::Utc::now()).await?))
}

async fn sensor_ids(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.readings.sensor_ids().await?))
}

/// Readings filtered by sensor and date range, oldest first.
async fn list_readings(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ReadingFilter>,
) -> Result<Json<Vec<ReadingRow>>> {
    Ok(Json(state.readings.query(&filter).await?))
}

async fn reading_stats(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ReadingFilter>,
) -> Result<Json<PressureStats>> {
    Ok(Json(state.readings.stats(&filter).await?))
}

/// CSV download of the filtered readings.
async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ReadingFilter>,
) -> Result<impl IntoResponse> {
    let rows = state.readings.query(&filter).await?;
    tracing::info!(rows = rows.len(), "Exporting readings as CSV");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"filtered_data.csv\"",
            ),
        ],
        readings_to_csv(&rows),
    ))
}

/// PDF download of the filtered readings.
async fn export_pdf(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ReadingFilter>,
) -> Result<impl IntoResponse> {
    let rows = state.readings.query(&filter).await?;
    tracing::info!(rows = rows.len(), "Exporting readings as PDF");

    let pdf = tokio::task::spawn_blocking(move || readings_to_pdf(&rows))
        .await
        .map_err(|e| anyhow::anyhow!("PDF export task failed: {}", e))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"filtered_data.pdf\"",
            ),
        ],
        pdf,
    ))
}
