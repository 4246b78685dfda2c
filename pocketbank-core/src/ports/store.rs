//! Storage ports - flat-file storage abstraction
//!
//! These traits define all persistence operations. Adapters provide the
//! actual storage logic; any engine satisfying these contracts is
//! substitutable.

use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{Credential, HistoryEntry, HistoryFilter, UserKey};

/// Credential persistence: one row per registered user
pub trait CredentialStore: Send + Sync {
    /// Look up a credential by user key (case-insensitive)
    fn find_credential(&self, key: &UserKey) -> Result<Option<Credential>>;

    /// Persist a new credential row. Uniqueness is checked upstream.
    fn insert_credential(&self, credential: &Credential) -> Result<()>;
}

/// Balance persistence: one row per user, overwritten in place
///
/// Only the current value matters here - the history log preserves the
/// trail.
pub trait LedgerStore: Send + Sync {
    /// Current balance; `0.00` for users without a balance row yet
    fn balance(&self, key: &UserKey) -> Result<Decimal>;

    /// Sole mutation entry point for stored balances.
    /// Rejects negative values with `Error::NegativeBalance`.
    fn set_balance(&self, key: &UserKey, new_balance: Decimal) -> Result<()>;
}

/// Append-only record of balance-affecting events
pub trait HistoryLog: Send + Sync {
    /// Append an entry. Never rejects on business grounds; validation
    /// happens upstream in the transaction service.
    fn append(&self, entry: &HistoryEntry) -> Result<()>;

    /// Entries for one user matching the filter, ordered by timestamp
    /// ascending with insertion order preserved on ties. Restartable:
    /// querying again re-reads stored data.
    fn query(&self, key: &UserKey, filter: &HistoryFilter) -> Result<Vec<HistoryEntry>>;
}
