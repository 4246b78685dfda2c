//! Transaction service - deposits, withdrawals and statements
//!
//! Each account's read-validate-write-append sequence runs under a
//! per-account mutex, so two in-flight transactions against the same
//! account cannot lose updates. The session idle check runs before the
//! account lock is taken and never while holding it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::money;
use crate::domain::result::Result;
use crate::domain::{HistoryEntry, HistoryFilter, TxKind, UserKey};
use crate::ports::{HistoryLog, LedgerStore};
use crate::services::SessionManager;

/// Category recorded when the caller supplies none
const DEFAULT_CATEGORY: &str = "General";

/// Outcome of a committed deposit or withdrawal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionResult {
    pub new_balance: Decimal,
    /// Advisory: the amount reached the configured suspicious threshold.
    /// The transaction is committed either way; confirmation is the
    /// caller's responsibility.
    pub suspicious: bool,
}

/// Transaction service orchestrating ledger and history
pub struct TransactionService {
    ledger: Arc<dyn LedgerStore>,
    history: Arc<dyn HistoryLog>,
    session: Arc<SessionManager>,
    suspicious_limit: Decimal,
    account_locks: Mutex<HashMap<UserKey, Arc<Mutex<()>>>>,
}

impl TransactionService {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        history: Arc<dyn HistoryLog>,
        session: Arc<SessionManager>,
        suspicious_limit: Decimal,
    ) -> Self {
        Self {
            ledger,
            history,
            session,
            suspicious_limit,
            account_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Deposit a positive amount. Commits the transaction and flags it as
    /// suspicious at or above the configured limit.
    pub fn deposit(
        &self,
        user: &UserKey,
        amount: Decimal,
        category: &str,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<TransactionResult> {
        self.begin(user, now)?;
        let amount = money::validate_amount(amount)?;

        let lock = self.account_lock(user);
        let _guard = lock.lock().unwrap();

        let current = self.ledger.balance(user)?;
        let new_balance = money::to_money(current + amount);
        self.commit(user, TxKind::Deposit, amount, current, new_balance, category, note, now)?;

        Ok(TransactionResult {
            new_balance,
            suspicious: amount >= self.suspicious_limit,
        })
    }

    /// Withdraw a positive amount. Fails with `InsufficientFunds` before
    /// any state is touched when the balance does not cover it.
    pub fn withdraw(
        &self,
        user: &UserKey,
        amount: Decimal,
        category: &str,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<TransactionResult> {
        self.begin(user, now)?;
        let amount = money::validate_amount(amount)?;

        let lock = self.account_lock(user);
        let _guard = lock.lock().unwrap();

        let current = self.ledger.balance(user)?;
        if amount > current {
            return Err(crate::domain::result::Error::InsufficientFunds {
                requested: amount,
                available: current,
            });
        }
        let new_balance = money::to_money(current - amount);
        self.commit(user, TxKind::Withdrawal, amount, current, new_balance, category, note, now)?;

        Ok(TransactionResult {
            new_balance,
            suspicious: amount >= self.suspicious_limit,
        })
    }

    /// Current balance for the authenticated user
    pub fn balance(&self, user: &UserKey, now: DateTime<Utc>) -> Result<Decimal> {
        self.begin(user, now)?;
        self.ledger.balance(user)
    }

    /// Filtered, time-ordered transaction history
    pub fn statement(
        &self,
        user: &UserKey,
        filter: &HistoryFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>> {
        self.begin(user, now)?;
        self.history.query(user, filter)
    }

    /// Session gate run on every operation attempt: drive the idle check,
    /// then require an active session for this user.
    fn begin(&self, user: &UserKey, now: DateTime<Utc>) -> Result<()> {
        self.session.tick(now);
        self.session.ensure_active(user)?;
        self.session.record_activity(now);
        Ok(())
    }

    fn account_lock(&self, user: &UserKey) -> Arc<Mutex<()>> {
        let mut locks = self.account_locks.lock().unwrap();
        Arc::clone(locks.entry(user.clone()).or_default())
    }

    /// Balance write and history append as one logical unit. If the append
    /// fails after the balance landed, the previous balance is restored so
    /// history stays the source of truth, and the operation reports the
    /// storage failure.
    #[allow(clippy::too_many_arguments)]
    fn commit(
        &self,
        user: &UserKey,
        kind: TxKind,
        amount: Decimal,
        previous_balance: Decimal,
        new_balance: Decimal,
        category: &str,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ledger.set_balance(user, new_balance)?;

        let category = category.trim();
        let entry = HistoryEntry {
            owner: user.clone(),
            kind,
            amount,
            resulting_balance: new_balance,
            timestamp: now,
            category: if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category.to_string()
            },
            note: note.to_string(),
        };

        if let Err(append_err) = self.history.append(&entry) {
            if let Err(rollback_err) = self.ledger.set_balance(user, previous_balance) {
                tracing::error!(
                    user = %user,
                    error = %rollback_err,
                    "balance rollback failed after history append error"
                );
            }
            return Err(append_err);
        }

        tracing::info!(user = %user, %kind, %amount, %new_balance, "transaction committed");
        Ok(())
    }
}
