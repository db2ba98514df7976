// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gateway readings: latest-per-sensor overview, filtering and statistics.

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{
    LatestReading, PressureStats, ReadingFilter, ReadingRow, SensorReading, TimedReading,
};
use crate::time_utils::{format_display, format_utc_rfc3339, parse_timestamp, start_of_day};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Parse timestamps and sort oldest first. Readings whose timestamp cannot
/// be parsed are dropped.
pub fn to_timed(readings: Vec<SensorReading>) -> Vec<TimedReading> {
    let mut timed: Vec<TimedReading> = readings
        .into_iter()
        .filter_map(|r| match parse_timestamp(&r.timestamp) {
            Some(at) => Some(TimedReading {
                sensor_id: r.sensor_id,
                at,
                pressure: r.pressure,
            }),
            None => {
                tracing::debug!(sensor_id = %r.sensor_id, "Skipping reading with unparsable timestamp");
                None
            }
        })
        .collect();

    timed.sort_by(|a, b| a.at.cmp(&b.at));
    timed
}

/// Newest reading for each sensor, ordered by sensor id.
pub fn latest_per_sensor(readings: &[TimedReading]) -> Vec<&TimedReading> {
    let mut latest: BTreeMap<&str, &TimedReading> = BTreeMap::new();
    for reading in readings {
        latest
            .entry(reading.sensor_id.as_str())
            .and_modify(|current| {
                if reading.at > current.at {
                    *current = reading;
                }
            })
            .or_insert(reading);
    }
    latest.into_values().collect()
}

/// Readings matching `filter`. Start and end dates are inclusive days in
/// `offset`.
pub fn apply_filter(
    readings: &[TimedReading],
    filter: &ReadingFilter,
    offset: FixedOffset,
) -> Result<Vec<TimedReading>, AppError> {
    if let (Some(start), Some(end)) = (filter.start, filter.end) {
        if start > end {
            return Err(AppError::BadRequest("start date is after end date".to_string()));
        }
    }

    let lower = match filter.start {
        Some(day) => Some(
            start_of_day(day, offset)
                .ok_or_else(|| AppError::BadRequest("invalid start date".to_string()))?,
        ),
        None => None,
    };
    let upper = match filter.end {
        Some(day) => {
            let next = day
                .succ_opt()
                .ok_or_else(|| AppError::BadRequest("invalid end date".to_string()))?;
            Some(
                start_of_day(next, offset)
                    .ok_or_else(|| AppError::BadRequest("invalid end date".to_string()))?,
            )
        }
        None => None,
    };
    let sensor = filter.sensor_id();

    Ok(readings
        .iter()
        .filter(|r| lower.is_none_or(|l| r.at >= l))
        .filter(|r| upper.is_none_or(|u| r.at < u))
        .filter(|r| sensor.is_none_or(|s| r.sensor_id == s))
        .cloned()
        .collect())
}

/// Count, mean, median and sample standard deviation.
pub fn pressure_stats(values: &[f64]) -> PressureStats {
    let n = values.len();
    if n == 0 {
        return PressureStats {
            total_records: 0,
            mean: None,
            median: None,
            std_dev: None,
        };
    }

    let mean = values.iter().sum::<f64>() / n as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    let std_dev = (n > 1).then(|| {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    });

    PressureStats {
        total_records: n,
        mean: Some(mean),
        median: Some(median),
        std_dev,
    }
}

/// Read-only access to `iot_gateway_reading`.
#[derive(Clone)]
pub struct ReadingsService {
    db: Arc<FirestoreDb>,
    stale_after: Duration,
    offset: FixedOffset,
}

impl ReadingsService {
    pub fn new(db: Arc<FirestoreDb>, config: &Config) -> Self {
        Self {
            db,
            stale_after: config.stale_reading_after,
            offset: config.display_offset,
        }
    }

    async fn load(&self) -> Result<Vec<TimedReading>, AppError> {
        Ok(to_timed(self.db.list_readings().await?))
    }

    fn row(&self, reading: &TimedReading) -> ReadingRow {
        ReadingRow {
            sensor_id: reading.sensor_id.clone(),
            timestamp: format_utc_rfc3339(reading.at),
            formatted_timestamp: format_display(reading.at, self.offset),
            pressure: reading.pressure,
        }
    }

    /// Latest reading per sensor, flagged stale relative to `now`.
    pub async fn latest(&self, now: DateTime<Utc>) -> Result<Vec<LatestReading>, AppError> {
        let readings = self.load().await?;

        Ok(latest_per_sensor(&readings)
            .into_iter()
            .map(|r| LatestReading {
                sensor_id: r.sensor_id.clone(),
                timestamp: format_utc_rfc3339(r.at),
                formatted_timestamp: format_display(r.at, self.offset),
                pressure: r.pressure,
                is_stale: now - r.at > self.stale_after,
            })
            .collect())
    }

    /// Distinct sensor ids, sorted. Sensors with no parsable reading are
    /// left out, as in every other view.
    pub async fn sensor_ids(&self) -> Result<Vec<String>, AppError> {
        let readings = self.load().await?;
        let ids: BTreeSet<String> = readings.into_iter().map(|r| r.sensor_id).collect();
        Ok(ids.into_iter().collect())
    }

    /// Filtered readings, oldest first.
    pub async fn query(&self, filter: &ReadingFilter) -> Result<Vec<ReadingRow>, AppError> {
        let readings = self.load().await?;
        let matching = apply_filter(&readings, filter, self.offset)?;
        Ok(matching.iter().map(|r| self.row(r)).collect())
    }

    /// Statistics over the filtered readings.
    pub async fn stats(&self, filter: &ReadingFilter) -> Result<PressureStats, AppError> {
        let readings = self.load().await?;
        let matching = apply_filter(&readings, filter, self.offset)?;
        let values: Vec<f64> = matching.iter().map(|r| r.pressure).collect();
        Ok(pressure_stats(&values))
    }
}
