//! Auth service - registration and PIN verification
//!
//! PIN digests are SHA-256 over PIN + salt + pepper, hex-encoded. The
//! pepper is a process-wide secret supplied through configuration; this
//! is a demonstration-grade construction, not a vault.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::result::{Error, Result};
use crate::domain::{validate_name, validate_pin, Credential, UserKey};
use crate::ports::CredentialStore;

/// Consecutive failed verifications before a temporary lockout
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Lockout window after too many failures
const LOCKOUT_MINUTES: i64 = 5;

/// Salt length in bytes (32 hex chars on disk)
const SALT_LEN: usize = 16;

#[derive(Debug, Default)]
struct AttemptRecord {
    failures: u32,
    locked_until: Option<DateTime<Utc>>,
}

/// Auth service over a credential store
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    pepper: String,
    attempts: Mutex<HashMap<UserKey, AttemptRecord>>,
}

impl AuthService {
    pub fn new(credentials: Arc<dyn CredentialStore>, pepper: impl Into<String>) -> Self {
        Self {
            credentials,
            pepper: pepper.into(),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new user with a fresh salt. The normalized name must be
    /// unique; salt and hash are immutable afterwards.
    pub fn register(&self, name: &str, pin: &str) -> Result<UserKey> {
        let name = name.trim();
        validate_name(name)?;
        validate_pin(pin)?;

        let key = UserKey::new(name);
        if self.credentials.find_credential(&key)?.is_some() {
            return Err(Error::DuplicateUser(name.to_string()));
        }

        let salt = generate_salt();
        let credential = Credential {
            name: name.to_string(),
            salt: salt.clone(),
            hashed_pin: hash_pin(pin, &salt, &self.pepper),
        };
        self.credentials.insert_credential(&credential)?;
        tracing::info!(user = %key, "registered new user");
        Ok(key)
    }

    /// Verify a PIN against the stored digest. Read-only apart from the
    /// in-memory failed-attempt counter.
    pub fn verify(&self, name: &str, pin: &str, now: DateTime<Utc>) -> Result<UserKey> {
        let key = UserKey::new(name);
        self.check_lockout(&key, now)?;

        let credential = self
            .credentials
            .find_credential(&key)?
            .ok_or_else(|| Error::NoSuchUser(name.trim().to_string()))?;

        // Rows written before salting existed carry an empty salt and an
        // unsalted digest
        let computed = if credential.salt.is_empty() {
            hash_pin_legacy(pin)
        } else {
            hash_pin(pin, &credential.salt, &self.pepper)
        };

        if !constant_time_eq(computed.as_bytes(), credential.hashed_pin.as_bytes()) {
            self.record_failure(&key, now);
            return Err(Error::WrongPin);
        }

        self.attempts.lock().unwrap().remove(&key);
        tracing::debug!(user = %key, "PIN verified");
        Ok(key)
    }

    fn check_lockout(&self, key: &UserKey, now: DateTime<Utc>) -> Result<()> {
        let attempts = self.attempts.lock().unwrap();
        if let Some(record) = attempts.get(key) {
            if let Some(until) = record.locked_until {
                if now < until {
                    return Err(Error::LockedOut { until });
                }
            }
        }
        Ok(())
    }

    fn record_failure(&self, key: &UserKey, now: DateTime<Utc>) {
        let mut attempts = self.attempts.lock().unwrap();
        let record = attempts.entry(key.clone()).or_default();
        record.failures += 1;
        if record.failures >= MAX_LOGIN_ATTEMPTS {
            record.locked_until = Some(now + Duration::minutes(LOCKOUT_MINUTES));
            record.failures = 0;
            tracing::warn!(user = %key, "too many failed attempts, locking out");
        }
    }
}

/// Salted and peppered PIN digest, hex-encoded.
/// Digest material order is PIN, then salt, then pepper.
fn hash_pin(pin: &str, salt_hex: &str, pepper: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    hasher.update(salt_hex.as_bytes());
    hasher.update(pepper.as_bytes());
    hex::encode(hasher.finalize())
}

/// Unsalted digest for legacy rows
fn hash_pin_legacy(pin: &str) -> String {
    hex::encode(Sha256::digest(pin.as_bytes()))
}

fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Compare without an early exit so timing does not leak the match prefix
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
