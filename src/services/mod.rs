// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod export;
pub mod readings;
pub mod session;
pub mod users;

pub use auth::{Authenticator, PasswordHasher};
pub use readings::ReadingsService;
pub use session::{Route, Session, SessionGate, SessionState, SessionStore};
pub use users::UserStore;
