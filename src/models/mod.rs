// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod reading;
pub mod user;

pub use reading::{
    LatestReading, PressureStats, ReadingFilter, ReadingRow, SensorReading, TimedReading,
};
pub use user::{NewUser, UserChanges, UserProfile, UserRecord, UserUpdate};
