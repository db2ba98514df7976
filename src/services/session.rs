// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session gating.
//!
//! A [`Session`] is either anonymous or authenticated as one user. The only
//! way in is a successful login through [`SessionGate`]; the ways out are
//! [`SessionGate::end_session`] and the idle timeout. The gate is plain
//! function calls so any front end can drive it; the HTTP routes keep
//! sessions in a [`SessionStore`] keyed by an opaque cookie value.

use crate::error::AppError;
use crate::services::auth::Authenticator;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated { username: String },
}

/// Per-interaction authentication state. Never persisted.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    last_active: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Anonymous,
            last_active: Utc::now(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn logged_in(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { username } => Some(username),
            SessionState::Anonymous => None,
        }
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    fn clear(&mut self) {
        self.state = SessionState::Anonymous;
    }
}

/// Where the front end should send the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Protected { username: String },
}

/// Moves sessions between anonymous and authenticated.
#[derive(Clone)]
pub struct SessionGate {
    authenticator: Authenticator,
    idle_timeout: Option<Duration>,
}

impl SessionGate {
    pub fn new(authenticator: Authenticator, idle_timeout: Option<Duration>) -> Self {
        Self {
            authenticator,
            idle_timeout,
        }
    }

    /// Whether an authenticated session has been idle too long at `now`.
    pub fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        match self.idle_timeout {
            Some(timeout) => session.logged_in() && now - session.last_active > timeout,
            None => false,
        }
    }

    pub fn is_authenticated(&self, session: &mut Session) -> bool {
        self.is_authenticated_at(session, Utc::now())
    }

    /// Check the session at `now`. An idle-expired session is cleared; an
    /// active one has its idle clock reset.
    pub fn is_authenticated_at(&self, session: &mut Session, now: DateTime<Utc>) -> bool {
        if !session.logged_in() {
            return false;
        }
        if self.is_expired(session, now) {
            tracing::info!(username = session.username(), "Session expired after idle timeout");
            session.clear();
            return false;
        }
        session.last_active = now;
        true
    }

    /// Log in. On success the session becomes authenticated as `username`;
    /// on failure it is left anonymous.
    pub async fn authenticate_and_start_session(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> Result<bool, AppError> {
        if !self.authenticator.login(username, password).await? {
            session.clear();
            return Ok(false);
        }

        session.state = SessionState::Authenticated {
            username: username.to_string(),
        };
        session.last_active = Utc::now();
        Ok(true)
    }

    /// Log out. Always leaves the session anonymous.
    pub fn end_session(&self, session: &mut Session) {
        if let Some(username) = session.username() {
            tracing::info!(username, "Session ended");
        }
        session.clear();
    }

    /// Login page or protected content, depending on the session.
    pub fn route(&self, session: &mut Session) -> Route {
        if self.is_authenticated(session) {
            if let Some(username) = session.username() {
                return Route::Protected {
                    username: username.to_string(),
                };
            }
        }
        Route::Login
    }
}

/// Authenticated sessions for the HTTP front end, keyed by session id.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    rng: SystemRandom,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            rng: SystemRandom::new(),
        }
    }

    /// Store a session under a fresh random id and return the id.
    pub fn insert(&self, session: Session) -> Result<String, AppError> {
        let mut bytes = [0u8; 32];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate session id")))?;

        let id = URL_SAFE_NO_PAD.encode(bytes);
        self.sessions.insert(id.clone(), session);
        Ok(id)
    }

    /// Run `f` against the session with this id, if any.
    ///
    /// `f` must not block; the entry is locked while it runs.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    /// Check a session and drop it if it is no longer authenticated.
    /// Returns the username on success.
    pub fn authenticated_user(&self, gate: &SessionGate, id: &str) -> Option<String> {
        let username = self
            .with_session(id, |session| {
                gate.is_authenticated(session)
                    .then(|| session.username().map(str::to_string))
                    .flatten()
            })
            .flatten();

        if username.is_none() {
            self.sessions.remove(id);
        }
        username
    }

    /// End and forget a session. Unknown ids are ignored.
    pub fn end(&self, gate: &SessionGate, id: &str) {
        if let Some((_, mut session)) = self.sessions.remove(id) {
            gate.end_session(&mut session);
        }
    }

    /// Drop every session that is anonymous or idle-expired at `now`.
    /// Returns how many were removed.
    pub fn purge_expired(&self, gate: &SessionGate, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.logged_in() && !gate.is_expired(session, now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
