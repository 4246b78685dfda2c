//! History domain model
//!
//! History entries are immutable once appended; the log is the source of
//! truth for reconstructing any balance.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::credential::UserKey;

/// Kind of a balance-affecting event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    Deposit,
    Withdrawal,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Deposit => "Deposit",
            TxKind::Withdrawal => "Withdrawal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Deposit" => Some(TxKind::Deposit),
            "Withdrawal" => Some(TxKind::Withdrawal),
            _ => None,
        }
    }

    /// Sign applied to the amount when replaying history
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TxKind::Deposit => amount,
            TxKind::Withdrawal => -amount,
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of a single balance-affecting event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub owner: UserKey,
    pub kind: TxKind,
    /// Always positive; the kind carries the sign
    pub amount: Decimal,
    /// Balance after this entry was committed
    pub resulting_balance: Decimal,
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub note: String,
}

/// Kind filter for history queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Deposit,
    Withdrawal,
}

impl KindFilter {
    fn matches(&self, kind: TxKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Deposit => kind == TxKind::Deposit,
            KindFilter::Withdrawal => kind == TxKind::Withdrawal,
        }
    }
}

/// Filter for history queries; the default matches everything
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub kind: KindFilter,
    /// Exact category label; `None` matches all categories
    pub category: Option<String>,
}

impl HistoryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if !self.kind.matches(entry.kind) {
            return false;
        }
        match &self.category {
            Some(category) => entry.category == *category,
            None => true,
        }
    }
}
