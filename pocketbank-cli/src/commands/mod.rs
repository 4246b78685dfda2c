//! CLI command implementations

pub mod balance;
pub mod deposit;
pub mod register;
pub mod shell;
pub mod statement;
pub mod withdraw;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use dialoguer::Password;
use rust_decimal::Decimal;

use pocketbank_core::{BankContext, UserKey};

/// Get the pocketbank data directory from environment or default
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PB_DATA_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".pocketbank")
    }
}

/// Get or create the pocketbank context
pub fn get_context() -> Result<BankContext> {
    let data_dir = get_data_dir();

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    BankContext::new(&data_dir).context("Failed to initialize pocketbank context")
}

/// Get the PIN from the PB_PIN environment variable or prompt for it
pub fn get_pin_or_prompt(prompt: &str) -> Result<String> {
    if let Ok(pin) = std::env::var("PB_PIN") {
        return Ok(pin);
    }
    let pin = Password::new().with_prompt(prompt).interact()?;
    Ok(pin)
}

/// Verify the PIN for `name` and open a session for that user
pub fn authenticate(ctx: &BankContext, name: &str) -> Result<UserKey> {
    let pin = get_pin_or_prompt(&format!("PIN for {}", name))?;
    let now = Utc::now();
    let key = ctx.auth_service.verify(name, &pin, now)?;
    ctx.session.login(key.clone(), now);
    Ok(key)
}

/// Parse a user-supplied amount string
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim())
        .with_context(|| format!("'{}' is not a valid amount", raw))
}
