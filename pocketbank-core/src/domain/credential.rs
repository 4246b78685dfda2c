//! Credential domain model

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Required PIN length (ASCII digits)
pub const PIN_LEN: usize = 4;

/// Maximum accepted name length
const MAX_NAME_LEN: usize = 49;

/// Case-insensitive user key
///
/// This is the sole join key between the credential, ledger and history
/// stores: a trimmed, lowercased form of the registered name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored credential: one per registered user
///
/// `salt` may be empty for legacy rows written before salting existed;
/// those verify against the unsalted digest until the user re-registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Display form of the name, as entered at registration (trimmed)
    pub name: String,
    /// Per-user random salt, hex-encoded
    pub salt: String,
    /// Hex SHA-256 digest of PIN + salt + pepper
    pub hashed_pin: String,
}

impl Credential {
    pub fn key(&self) -> UserKey {
        UserKey::new(&self.name)
    }
}

/// Validate a PIN: exactly four ASCII digits
pub fn validate_pin(pin: &str) -> Result<()> {
    if pin.len() != PIN_LEN || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidPin(format!(
            "PIN must be exactly {PIN_LEN} digits"
        )));
    }
    Ok(())
}

/// Validate a registration name: starts with a letter, then letters,
/// spaces, hyphens or apostrophes, 2..=49 characters
pub fn validate_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.len() < 2 || name.len() > MAX_NAME_LEN {
        return Err(Error::InvalidName(format!(
            "name must be 2 to {MAX_NAME_LEN} characters"
        )));
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap_or(' ');
    if !first.is_ascii_alphabetic() {
        return Err(Error::InvalidName(
            "name must start with a letter".to_string(),
        ));
    }
    if !chars.all(|c| c.is_ascii_alphabetic() || c == ' ' || c == '-' || c == '\'') {
        return Err(Error::InvalidName(
            "name may only contain letters, spaces, hyphens and apostrophes".to_string(),
        ));
    }
    Ok(())
}
