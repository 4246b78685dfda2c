//! Trait definitions for storage dependencies

mod store;

pub use store::{CredentialStore, HistoryLog, LedgerStore};
