//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "suspiciousLimit": "1000.00",
//!   "currency": "USD",
//!   "idleLockSecs": 180,
//!   "categories": ["General", "Salary"],
//!   "pinPepper": "f6c6408a5b8a4680b7b8b7e7"
//! }
//! ```
//! The pepper is a process-start secret, never a compiled-in constant:
//! the `PB_PIN_PEPPER` environment variable wins, then the settings file;
//! on first run with neither, a random pepper is generated and persisted.

use std::collections::HashMap;
use std::path::Path;

use chrono::Duration;
use rand::RngCore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// Default idle-lock threshold in seconds
pub const DEFAULT_IDLE_LOCK_SECS: i64 = 180;

/// Default currency label
pub const DEFAULT_CURRENCY: &str = "USD";

/// Default transaction categories. The set is open: these feed pickers
/// and defaults, any non-empty label is accepted on commit.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "General",
    "Salary",
    "Savings",
    "Rent",
    "Groceries",
    "Utilities",
    "Transfer",
    "ATM",
    "Entertainment",
    "Bills",
    "Other",
];

const SETTINGS_FILE: &str = "settings.json";

fn default_suspicious_limit() -> Decimal {
    Decimal::new(100000, 2) // 1000.00
}

/// Raw settings.json structure. Unmanaged fields are preserved on save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    suspicious_limit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    idle_lock_secs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pin_pepper: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Pocketbank configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Amounts at or above this are flagged suspicious (advisory)
    pub suspicious_limit: Decimal,
    pub currency: String,
    /// Idle duration after which an active session locks
    pub idle_lock: Duration,
    pub categories: Vec<String>,
    /// Process-wide secret mixed into every PIN digest
    pub pin_pepper: String,
}

impl Config {
    /// Load config from the data directory, generating and persisting a
    /// pepper on first run if none is configured.
    ///
    /// Environment overrides: `PB_PIN_PEPPER`, `PB_IDLE_LOCK_SECS`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        // A file that exists but does not parse is an error, not a default:
        // regenerating the pepper over a bad parse would orphan every
        // stored credential.
        let mut raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).map_err(|e| {
                crate::domain::result::Error::config(format!(
                    "cannot parse {}: {e}",
                    settings_path.display()
                ))
            })?
        } else {
            SettingsFile::default()
        };

        let pin_pepper = match std::env::var("PB_PIN_PEPPER").ok().filter(|p| !p.is_empty()) {
            Some(pepper) => pepper,
            None => match raw.pin_pepper.clone() {
                Some(pepper) => pepper,
                None => {
                    let pepper = generate_pepper();
                    raw.pin_pepper = Some(pepper.clone());
                    std::fs::create_dir_all(data_dir)?;
                    let content = serde_json::to_string_pretty(&raw)
                        .map_err(|e| crate::domain::result::Error::config(e.to_string()))?;
                    std::fs::write(&settings_path, content)?;
                    tracing::info!("generated PIN pepper on first run");
                    pepper
                }
            },
        };

        let idle_lock_secs = std::env::var("PB_IDLE_LOCK_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .or(raw.idle_lock_secs)
            .unwrap_or(DEFAULT_IDLE_LOCK_SECS);

        Ok(Self {
            suspicious_limit: raw.suspicious_limit.unwrap_or_else(default_suspicious_limit),
            currency: raw.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            idle_lock: Duration::seconds(idle_lock_secs),
            categories: raw.categories.unwrap_or_else(|| {
                DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
            }),
            pin_pepper,
        })
    }
}

fn generate_pepper() -> String {
    let mut bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
