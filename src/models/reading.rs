// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! IoT gateway readings and their derived views.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One document from `iot_gateway_reading`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(rename = "sensorID")]
    pub sensor_id: String,
    /// ISO-8601, with or without an offset (naive values are UTC)
    pub timestamp: String,
    pub pressure: f64,
}

/// A reading whose timestamp has been parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedReading {
    pub sensor_id: String,
    pub at: DateTime<Utc>,
    pub pressure: f64,
}

/// Latest reading for one sensor, as shown on the overview page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestReading {
    pub sensor_id: String,
    pub timestamp: String,
    pub formatted_timestamp: String,
    pub pressure: f64,
    pub is_stale: bool,
}

/// Row of the filtered readings table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingRow {
    pub sensor_id: String,
    pub timestamp: String,
    pub formatted_timestamp: String,
    pub pressure: f64,
}

/// Filter applied to readings. Dates are calendar days in the display
/// offset and both ends are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReadingFilter {
    /// Sensor id, or `All`/absent for every sensor
    pub sensor: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ReadingFilter {
    /// Sensor to match, treating `All` as no restriction.
    pub fn sensor_id(&self) -> Option<&str> {
        self.sensor
            .as_deref()
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
    }
}

/// Summary statistics over pressure values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PressureStats {
    pub total_records: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation (n - 1); needs at least two readings
    pub std_dev: Option<f64>,
}
