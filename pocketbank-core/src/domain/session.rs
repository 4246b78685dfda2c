//! Session state machine
//!
//! A typed state value with an explicit clock input. Nothing here reads
//! the wall clock or depends on a UI event loop; callers pass `now` and
//! drive the idle check through `tick`.

use chrono::{DateTime, Duration, Utc};

use crate::domain::credential::UserKey;

/// Session lifecycle state
///
/// `LoggedOut` -> `Active` (login) -> `Locked` (idle timeout) -> `Active`
/// (login after a fresh verify). `logout` returns to `LoggedOut` from any
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    Active {
        user: UserKey,
        last_activity: DateTime<Utc>,
    },
    Locked {
        user: UserKey,
    },
}

impl SessionState {
    /// Enter `Active` for the given user. Callers coming from `Locked`
    /// must have re-verified the PIN first; an existing session is
    /// replaced.
    pub fn login(self, user: UserKey, now: DateTime<Utc>) -> Self {
        SessionState::Active {
            user,
            last_activity: now,
        }
    }

    /// Return to `LoggedOut` from any state
    pub fn logout(self) -> Self {
        SessionState::LoggedOut
    }

    /// Reset the idle clock; no-op unless `Active`
    pub fn record_activity(self, now: DateTime<Utc>) -> Self {
        match self {
            SessionState::Active { user, .. } => SessionState::Active {
                user,
                last_activity: now,
            },
            other => other,
        }
    }

    /// Apply the idle check. The only driver of `Active` -> `Locked`.
    pub fn tick(self, now: DateTime<Utc>, idle_lock: Duration) -> Self {
        match self {
            SessionState::Active {
                user,
                last_activity,
            } if now - last_activity >= idle_lock => SessionState::Locked { user },
            other => other,
        }
    }

    /// The user this session belongs to, if any
    pub fn user(&self) -> Option<&UserKey> {
        match self {
            SessionState::LoggedOut => None,
            SessionState::Active { user, .. } | SessionState::Locked { user } => Some(user),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active { .. })
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, SessionState::Locked { .. })
    }
}
