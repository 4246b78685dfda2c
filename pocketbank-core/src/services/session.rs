//! Session service - idle-timeout session management
//!
//! Wraps the `SessionState` machine behind a shared handle. Every clock
//! read is an explicit `now` argument; `tick` is a cooperative poll that
//! the transaction service drives on every operation attempt.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::domain::result::{Error, Result};
use crate::domain::{SessionState, UserKey};

/// Session manager tracking the authenticated identity and idle clock
pub struct SessionManager {
    state: Mutex<SessionState>,
    idle_lock: Duration,
}

impl SessionManager {
    pub fn new(idle_lock: Duration) -> Self {
        Self {
            state: Mutex::new(SessionState::LoggedOut),
            idle_lock,
        }
    }

    /// Transition to `Active`. Valid from `LoggedOut` or `Locked`; callers
    /// coming from `Locked` must have passed a fresh `verify` first.
    pub fn login(&self, user: UserKey, now: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        *state = state.clone().login(user.clone(), now);
        tracing::info!(user = %user, "session active");
    }

    /// Transition to `LoggedOut` from any state. Balances are durable
    /// after every transaction, so there is nothing to save here.
    pub fn logout(&self) {
        let mut state = self.state.lock().unwrap();
        *state = state.clone().logout();
        tracing::info!("session ended");
    }

    /// Reset the idle clock; no-op unless `Active`
    pub fn record_activity(&self, now: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        *state = state.clone().record_activity(now);
    }

    /// Apply the idle check. Must never hold a per-account lock; it only
    /// touches session state.
    pub fn tick(&self, now: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        let next = state.clone().tick(now, self.idle_lock);
        if next.is_locked() && !state.is_locked() {
            tracing::info!("session locked after idle timeout");
        }
        *state = next;
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.lock().unwrap().clone()
    }

    /// Fail with `NotAuthenticated` unless `Active` for this user
    pub fn ensure_active(&self, user: &UserKey) -> Result<()> {
        match &*self.state.lock().unwrap() {
            SessionState::Active { user: active, .. } if active == user => Ok(()),
            _ => Err(Error::NotAuthenticated),
        }
    }
}
