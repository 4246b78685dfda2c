//! Pocketbank Core - business logic for a PIN-authenticated cash ledger
//!
//! This crate implements the core domain logic following hexagonal
//! architecture:
//!
//! - **domain**: Core business entities (Credential, HistoryEntry, SessionState, etc.)
//! - **ports**: Trait definitions for storage (CredentialStore, LedgerStore, HistoryLog)
//! - **services**: Business logic orchestration (auth, transactions, sessions)
//! - **adapters**: Concrete implementations (CSV flat-file store)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use adapters::CsvStore;
use config::Config;
use services::{AuthService, SessionManager, TransactionService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{
    Credential, HistoryEntry, HistoryFilter, KindFilter, SessionState, TxKind, UserKey,
};
pub use services::TransactionResult;

/// Main context for Pocketbank operations
///
/// The primary entry point for all business logic: holds the CSV store,
/// configuration, the session manager and all services.
pub struct BankContext {
    pub config: Config,
    pub store: Arc<CsvStore>,
    pub session: Arc<SessionManager>,
    pub auth_service: AuthService,
    pub transaction_service: TransactionService,
}

impl std::fmt::Debug for BankContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankContext").finish_non_exhaustive()
    }
}

impl BankContext {
    /// Create a new context over a data directory, bootstrapping the CSV
    /// files and settings on first run.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let store = Arc::new(CsvStore::new(data_dir));
        store.ensure_files()?;

        let session = Arc::new(SessionManager::new(config.idle_lock));
        let auth_service = AuthService::new(
            Arc::clone(&store) as Arc<dyn ports::CredentialStore>,
            config.pin_pepper.clone(),
        );
        let transaction_service = TransactionService::new(
            Arc::clone(&store) as Arc<dyn ports::LedgerStore>,
            Arc::clone(&store) as Arc<dyn ports::HistoryLog>,
            Arc::clone(&session),
            config.suspicious_limit,
        );

        Ok(Self {
            config,
            store,
            session,
            auth_service,
            transaction_service,
        })
    }
}
