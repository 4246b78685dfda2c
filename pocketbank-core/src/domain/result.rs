//! Result and error types for the core library

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Core library error type
///
/// Every condition here is recoverable by the caller: the presentation
/// layer renders these as messages, nothing aborts the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("user already exists: {0}")]
    DuplicateUser(String),

    #[error("user not found: {0}")]
    NoSuchUser(String),

    #[error("invalid PIN")]
    WrongPin,

    #[error("invalid PIN: {0}")]
    InvalidPin(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error("balance may not go negative: {0}")]
    NegativeBalance(Decimal),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("too many failed attempts, try again after {until}")]
    LockedOut { until: DateTime<Utc> },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Create an invalid amount error
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::StorageUnavailable(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Self::StorageUnavailable(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
