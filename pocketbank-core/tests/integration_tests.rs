//! Integration tests for pocketbank-core services
//!
//! These tests run the full stack against real CSV files in a temp
//! directory. Storage failures are injected at the trait level.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;

use pocketbank_core::domain::money::to_money;
use pocketbank_core::ports::{HistoryLog, LedgerStore};
use pocketbank_core::services::{SessionManager, TransactionService};
use pocketbank_core::{
    BankContext, Error, HistoryEntry, HistoryFilter, KindFilter, TxKind, UserKey,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn create_context(dir: &TempDir) -> BankContext {
    BankContext::new(dir.path()).expect("Failed to create bank context")
}

fn money(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Register and log in, returning the user key
fn register_and_login(ctx: &BankContext, name: &str, pin: &str, now: DateTime<Utc>) -> UserKey {
    ctx.auth_service.register(name, pin).unwrap();
    let key = ctx.auth_service.verify(name, pin, now).unwrap();
    ctx.session.login(key.clone(), now);
    key
}

/// Replay the history log from zero and compare against the stored balance
fn assert_reconstructable(ctx: &BankContext, user: &UserKey) {
    let entries = ctx
        .store
        .query(user, &HistoryFilter::all())
        .expect("history query failed");
    let replayed = entries
        .iter()
        .fold(Decimal::ZERO, |acc, e| acc + e.kind.signed(e.amount));
    let stored = ctx.store.balance(user).expect("balance read failed");
    assert_eq!(
        to_money(replayed),
        stored,
        "stored balance must equal the replayed history"
    );
}

// ============================================================================
// End-to-end scenario
// ============================================================================

#[test]
fn test_end_to_end_scenario() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);
    let now = Utc::now();

    let alice = register_and_login(&ctx, "Alice", "1234", now);
    assert_eq!(
        ctx.transaction_service.balance(&alice, now).unwrap(),
        money("0.00")
    );

    let result = ctx
        .transaction_service
        .deposit(&alice, money("500.00"), "Salary", "", now)
        .unwrap();
    assert_eq!(result.new_balance, money("500.00"));
    assert!(!result.suspicious);

    let result = ctx
        .transaction_service
        .deposit(&alice, money("1000.00"), "Gift", "", now)
        .unwrap();
    assert_eq!(result.new_balance, money("1500.00"));
    assert!(result.suspicious);

    let err = ctx
        .transaction_service
        .withdraw(&alice, money("2000.00"), "General", "", now)
        .unwrap_err();
    assert_eq!(
        err,
        Error::InsufficientFunds {
            requested: money("2000.00"),
            available: money("1500.00"),
        }
    );
    assert_eq!(
        ctx.transaction_service.balance(&alice, now).unwrap(),
        money("1500.00")
    );

    let result = ctx
        .transaction_service
        .withdraw(&alice, money("200.00"), "General", "", now)
        .unwrap();
    assert_eq!(result.new_balance, money("1300.00"));

    let withdrawals = ctx
        .transaction_service
        .statement(
            &alice,
            &HistoryFilter {
                kind: KindFilter::Withdrawal,
                category: None,
            },
            now,
        )
        .unwrap();
    assert_eq!(withdrawals.len(), 1);
    assert_eq!(withdrawals[0].amount, money("200.00"));
    assert_eq!(withdrawals[0].resulting_balance, money("1300.00"));

    assert_reconstructable(&ctx, &alice);
}

// ============================================================================
// Ledger invariants
// ============================================================================

#[test]
fn test_reconstructability_over_many_operations() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);
    let now = Utc::now();
    let alice = register_and_login(&ctx, "Alice", "1234", now);

    let amounts = ["12.34", "0.01", "999.99", "250.00", "3.50"];
    for amount in amounts {
        ctx.transaction_service
            .deposit(&alice, money(amount), "General", "", now)
            .unwrap();
    }
    for amount in ["100.00", "0.01", "66.17"] {
        ctx.transaction_service
            .withdraw(&alice, money(amount), "General", "", now)
            .unwrap();
    }

    assert_reconstructable(&ctx, &alice);
}

#[test]
fn test_over_withdrawal_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);
    let now = Utc::now();
    let alice = register_and_login(&ctx, "Alice", "1234", now);

    ctx.transaction_service
        .deposit(&alice, money("50.00"), "General", "", now)
        .unwrap();

    let before = ctx
        .transaction_service
        .statement(&alice, &HistoryFilter::all(), now)
        .unwrap();

    let err = ctx
        .transaction_service
        .withdraw(&alice, money("50.01"), "General", "", now)
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds { .. }));

    let after = ctx
        .transaction_service
        .statement(&alice, &HistoryFilter::all(), now)
        .unwrap();
    assert_eq!(before, after, "failed withdrawal must not append history");
    assert_eq!(
        ctx.transaction_service.balance(&alice, now).unwrap(),
        money("50.00")
    );
}

#[test]
fn test_invalid_amounts_are_rejected() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);
    let now = Utc::now();
    let alice = register_and_login(&ctx, "Alice", "1234", now);

    for bad in ["0.00", "-5.00", "1.005"] {
        let err = ctx
            .transaction_service
            .deposit(&alice, money(bad), "General", "", now)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)), "amount {bad}");
    }
}

#[test]
fn test_suspicious_threshold_boundary() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);
    let now = Utc::now();
    let alice = register_and_login(&ctx, "Alice", "1234", now);

    let below = ctx
        .transaction_service
        .deposit(&alice, money("999.99"), "General", "", now)
        .unwrap();
    assert!(!below.suspicious);

    let at = ctx
        .transaction_service
        .deposit(&alice, money("1000.00"), "General", "", now)
        .unwrap();
    assert!(at.suspicious, "threshold is inclusive");

    // Suspicious transactions are committed regardless
    assert_eq!(at.new_balance, money("1999.99"));
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn test_operations_require_active_session() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);
    let now = Utc::now();

    let alice = ctx.auth_service.register("Alice", "1234").unwrap();

    // Logged out
    assert_eq!(
        ctx.transaction_service
            .deposit(&alice, money("10.00"), "General", "", now)
            .unwrap_err(),
        Error::NotAuthenticated
    );

    ctx.session.login(alice.clone(), now);
    ctx.transaction_service
        .deposit(&alice, money("10.00"), "General", "", now)
        .unwrap();

    ctx.session.logout();
    assert_eq!(
        ctx.transaction_service
            .statement(&alice, &HistoryFilter::all(), now)
            .unwrap_err(),
        Error::NotAuthenticated
    );
}

#[test]
fn test_idle_timeout_locks_out_transactions() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);
    let t0 = Utc::now();
    let alice = register_and_login(&ctx, "Alice", "1234", t0);

    // Just under the threshold: still active
    let t1 = t0 + Duration::seconds(179);
    ctx.transaction_service
        .deposit(&alice, money("10.00"), "General", "", t1)
        .unwrap();

    // Idle past the threshold: the operation itself drives the tick
    let t2 = t1 + Duration::seconds(180);
    assert_eq!(
        ctx.transaction_service
            .withdraw(&alice, money("1.00"), "General", "", t2)
            .unwrap_err(),
        Error::NotAuthenticated
    );
    assert!(ctx.session.state().is_locked());

    // Re-authentication unlocks
    let key = ctx.auth_service.verify("Alice", "1234", t2).unwrap();
    ctx.session.login(key, t2);
    ctx.transaction_service
        .withdraw(&alice, money("1.00"), "General", "", t2)
        .unwrap();
}

// ============================================================================
// Authentication
// ============================================================================

#[test]
fn test_register_is_unique_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);

    ctx.auth_service.register("Alice", "1234").unwrap();
    assert!(matches!(
        ctx.auth_service.register("ALICE", "5678"),
        Err(Error::DuplicateUser(_))
    ));
    assert!(matches!(
        ctx.auth_service.register("  alice ", "5678"),
        Err(Error::DuplicateUser(_))
    ));
}

#[test]
fn test_verify_matches_registration_pin_only() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);
    let now = Utc::now();

    ctx.auth_service.register("Alice", "1234").unwrap();
    assert!(ctx.auth_service.verify("alice", "1234", now).is_ok());
    assert_eq!(
        ctx.auth_service.verify("Alice", "1235", now),
        Err(Error::WrongPin)
    );
    assert!(matches!(
        ctx.auth_service.verify("Bob", "1234", now),
        Err(Error::NoSuchUser(_))
    ));
}

#[test]
fn test_credentials_survive_restart() {
    let dir = TempDir::new().unwrap();
    let now = Utc::now();

    {
        let ctx = create_context(&dir);
        let alice = register_and_login(&ctx, "Alice", "1234", now);
        ctx.transaction_service
            .deposit(&alice, money("75.25"), "Savings", "first", now)
            .unwrap();
    }

    // Fresh context over the same directory: pepper was persisted, so the
    // stored digest still verifies, and the balance is durable.
    let ctx = create_context(&dir);
    let alice = ctx.auth_service.verify("Alice", "1234", now).unwrap();
    ctx.session.login(alice.clone(), now);
    assert_eq!(
        ctx.transaction_service.balance(&alice, now).unwrap(),
        money("75.25")
    );
    assert_reconstructable(&ctx, &alice);
}

#[test]
fn test_corrupt_settings_never_rotate_the_pepper() {
    let dir = TempDir::new().unwrap();
    let now = Utc::now();

    {
        let ctx = create_context(&dir);
        ctx.auth_service.register("Alice", "1234").unwrap();
    }

    // Corrupt settings.json; startup must refuse rather than regenerate a
    // pepper, which would orphan every stored credential
    let settings_path = dir.path().join("settings.json");
    let good = std::fs::read_to_string(&settings_path).unwrap();
    let broken = good.replacen('{', "{,", 1);
    std::fs::write(&settings_path, &broken).unwrap();

    let err = BankContext::new(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(
        std::fs::read_to_string(&settings_path).unwrap(),
        broken,
        "startup must not rewrite an unparsable settings file"
    );

    // Restoring the file restores verification
    std::fs::write(&settings_path, &good).unwrap();
    let ctx = create_context(&dir);
    assert!(ctx.auth_service.verify("Alice", "1234", now).is_ok());
}

// ============================================================================
// Statement filtering
// ============================================================================

#[test]
fn test_statement_filters_by_kind_and_category() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);
    let now = Utc::now();
    let alice = register_and_login(&ctx, "Alice", "1234", now);

    ctx.transaction_service
        .deposit(&alice, money("100.00"), "Salary", "", now)
        .unwrap();
    ctx.transaction_service
        .deposit(&alice, money("20.00"), "Gift", "", now)
        .unwrap();
    ctx.transaction_service
        .withdraw(&alice, money("30.00"), "Rent", "", now)
        .unwrap();

    let deposits = ctx
        .transaction_service
        .statement(
            &alice,
            &HistoryFilter {
                kind: KindFilter::Deposit,
                category: None,
            },
            now,
        )
        .unwrap();
    assert_eq!(deposits.len(), 2);
    assert!(deposits.iter().all(|e| e.kind == TxKind::Deposit));

    let rent = ctx
        .transaction_service
        .statement(
            &alice,
            &HistoryFilter {
                kind: KindFilter::All,
                category: Some("Rent".to_string()),
            },
            now,
        )
        .unwrap();
    assert_eq!(rent.len(), 1);
    assert_eq!(rent[0].amount, money("30.00"));
}

#[test]
fn test_users_do_not_see_each_others_history() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);
    let now = Utc::now();

    let alice = register_and_login(&ctx, "Alice", "1234", now);
    ctx.transaction_service
        .deposit(&alice, money("100.00"), "General", "", now)
        .unwrap();
    ctx.session.logout();

    let bob = ctx.auth_service.register("Bob", "5678").unwrap();
    ctx.session.login(bob.clone(), now);
    assert_eq!(
        ctx.transaction_service.balance(&bob, now).unwrap(),
        money("0.00")
    );
    assert!(ctx
        .transaction_service
        .statement(&bob, &HistoryFilter::all(), now)
        .unwrap()
        .is_empty());
}

// ============================================================================
// Injected storage failures
// ============================================================================

/// History log that fails appends on demand, delegating otherwise
struct FlakyHistory {
    inner: Arc<dyn HistoryLog>,
    fail_appends: AtomicBool,
}

impl HistoryLog for FlakyHistory {
    fn append(&self, entry: &HistoryEntry) -> pocketbank_core::Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(Error::storage("injected append failure"));
        }
        self.inner.append(entry)
    }

    fn query(
        &self,
        key: &UserKey,
        filter: &HistoryFilter,
    ) -> pocketbank_core::Result<Vec<HistoryEntry>> {
        self.inner.query(key, filter)
    }
}

#[test]
fn test_append_failure_reports_error_and_rolls_back_balance() {
    let dir = TempDir::new().unwrap();
    let ctx = create_context(&dir);
    let now = Utc::now();
    let alice = ctx.auth_service.register("Alice", "1234").unwrap();

    let flaky = Arc::new(FlakyHistory {
        inner: Arc::clone(&ctx.store) as Arc<dyn HistoryLog>,
        fail_appends: AtomicBool::new(false),
    });
    let session = Arc::new(SessionManager::new(Duration::seconds(180)));
    session.login(alice.clone(), now);
    let service = TransactionService::new(
        Arc::clone(&ctx.store) as Arc<dyn LedgerStore>,
        Arc::clone(&flaky) as Arc<dyn HistoryLog>,
        session,
        ctx.config.suspicious_limit,
    );

    service
        .deposit(&alice, money("300.00"), "General", "", now)
        .unwrap();

    flaky.fail_appends.store(true, Ordering::SeqCst);
    let err = service
        .deposit(&alice, money("50.00"), "General", "", now)
        .unwrap_err();
    assert!(matches!(err, Error::StorageUnavailable(_)));

    // The balance was rolled back, so replaying history still matches it
    flaky.fail_appends.store(false, Ordering::SeqCst);
    assert_eq!(
        service.balance(&alice, now).unwrap(),
        money("300.00"),
        "failed operation must not move the balance"
    );
    assert_reconstructable(&ctx, &alice);

    // And the account keeps working afterwards
    let result = service
        .withdraw(&alice, money("100.00"), "General", "", now)
        .unwrap();
    assert_eq!(result.new_balance, money("200.00"));
    assert_reconstructable(&ctx, &alice);
}
