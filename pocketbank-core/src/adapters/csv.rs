//! CSV flat-file store
//!
//! One adapter implements all three storage ports over three files in the
//! data directory:
//!
//! - `users.csv`    - `Name,Salt,HashedPin`, one row per user
//! - `balance.csv`  - `Name,Balance`, one row per user, rewritten in place
//! - `history.csv`  - append-only transaction log
//!
//! Rows are keyed by the case-insensitive user key. Balance rewrites go
//! through a temp file in the same directory followed by a rename, so a
//! crash mid-write cannot truncate the live file.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money;
use crate::domain::result::{Error, Result};
use crate::domain::{Credential, HistoryEntry, HistoryFilter, TxKind, UserKey};
use crate::ports::{CredentialStore, HistoryLog, LedgerStore};

const USERS_FILE: &str = "users.csv";
const BALANCE_FILE: &str = "balance.csv";
const HISTORY_FILE: &str = "history.csv";

#[derive(Debug, Serialize, Deserialize)]
struct UserRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Salt")]
    salt: String,
    #[serde(rename = "HashedPin")]
    hashed_pin: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct BalanceRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Balance")]
    balance: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Balance")]
    balance: String,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Note")]
    note: String,
}

/// CSV-backed implementation of all three storage ports
pub struct CsvStore {
    users_path: PathBuf,
    balance_path: PathBuf,
    history_path: PathBuf,
    users_lock: Mutex<()>,
    balance_lock: Mutex<()>,
    history_lock: Mutex<()>,
}

impl CsvStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            users_path: data_dir.join(USERS_FILE),
            balance_path: data_dir.join(BALANCE_FILE),
            history_path: data_dir.join(HISTORY_FILE),
            users_lock: Mutex::new(()),
            balance_lock: Mutex::new(()),
            history_lock: Mutex::new(()),
        }
    }

    /// Create the data directory and CSV files with headers on first run
    pub fn ensure_files(&self) -> Result<()> {
        if let Some(dir) = self.users_path.parent() {
            fs::create_dir_all(dir)?;
        }

        if !file_has_content(&self.users_path) {
            let mut writer = csv::Writer::from_path(&self.users_path)?;
            writer.write_record(["Name", "Salt", "HashedPin"])?;
            writer.flush()?;
        }
        if !file_has_content(&self.balance_path) {
            let mut writer = csv::Writer::from_path(&self.balance_path)?;
            writer.write_record(["Name", "Balance"])?;
            writer.flush()?;
        }
        if !file_has_content(&self.history_path) {
            let mut writer = csv::Writer::from_path(&self.history_path)?;
            writer.write_record([
                "Name",
                "Type",
                "Amount",
                "Balance",
                "Timestamp",
                "Category",
                "Note",
            ])?;
            writer.flush()?;
        }
        Ok(())
    }

    fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Rewrite a whole CSV file through a temp file + rename
    fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
        let tmp_path = path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

impl CredentialStore for CsvStore {
    fn find_credential(&self, key: &UserKey) -> Result<Option<Credential>> {
        let _guard = self.users_lock.lock().unwrap();
        let rows: Vec<UserRow> = Self::read_rows(&self.users_path)?;
        Ok(rows
            .into_iter()
            .find(|row| UserKey::new(&row.name) == *key)
            .map(|row| Credential {
                name: row.name,
                salt: row.salt,
                hashed_pin: row.hashed_pin,
            }))
    }

    fn insert_credential(&self, credential: &Credential) -> Result<()> {
        let _guard = self.users_lock.lock().unwrap();
        let new_file = !file_has_content(&self.users_path);
        let file = open_for_append(&self.users_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(new_file)
            .from_writer(file);
        writer.serialize(UserRow {
            name: credential.name.clone(),
            salt: credential.salt.clone(),
            hashed_pin: credential.hashed_pin.clone(),
        })?;
        writer.flush()?;
        Ok(())
    }
}

impl LedgerStore for CsvStore {
    fn balance(&self, key: &UserKey) -> Result<Decimal> {
        let _guard = self.balance_lock.lock().unwrap();
        let rows: Vec<BalanceRow> = Self::read_rows(&self.balance_path)?;
        match rows.iter().find(|row| UserKey::new(&row.name) == *key) {
            Some(row) => parse_decimal(&row.balance, "Balance"),
            None => Ok(money::to_money(Decimal::ZERO)),
        }
    }

    fn set_balance(&self, key: &UserKey, new_balance: Decimal) -> Result<()> {
        if new_balance < Decimal::ZERO {
            return Err(Error::NegativeBalance(new_balance));
        }

        let _guard = self.balance_lock.lock().unwrap();
        let mut rows: Vec<BalanceRow> = Self::read_rows(&self.balance_path)?;
        let formatted = money::format_money(new_balance);
        match rows.iter_mut().find(|row| UserKey::new(&row.name) == *key) {
            Some(row) => row.balance = formatted,
            None => rows.push(BalanceRow {
                name: key.as_str().to_string(),
                balance: formatted,
            }),
        }
        Self::write_rows(&self.balance_path, &rows)
    }
}

impl HistoryLog for CsvStore {
    fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let _guard = self.history_lock.lock().unwrap();
        let new_file = !file_has_content(&self.history_path);
        let file = open_for_append(&self.history_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(new_file)
            .from_writer(file);
        writer.serialize(HistoryRow {
            name: entry.owner.as_str().to_string(),
            kind: entry.kind.as_str().to_string(),
            amount: money::format_money(entry.amount),
            balance: money::format_money(entry.resulting_balance),
            timestamp: entry
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true),
            category: entry.category.clone(),
            note: entry.note.clone(),
        })?;
        writer.flush()?;
        Ok(())
    }

    fn query(&self, key: &UserKey, filter: &HistoryFilter) -> Result<Vec<HistoryEntry>> {
        let _guard = self.history_lock.lock().unwrap();
        let rows: Vec<HistoryRow> = Self::read_rows(&self.history_path)?;

        let mut entries = Vec::new();
        for row in rows {
            if UserKey::new(&row.name) != *key {
                continue;
            }
            let entry = parse_history_row(row)?;
            if filter.matches(&entry) {
                entries.push(entry);
            }
        }

        // Stable sort: file order is insertion order, preserved on ties
        entries.sort_by_key(|entry| entry.timestamp);
        Ok(entries)
    }
}

fn parse_history_row(row: HistoryRow) -> Result<HistoryEntry> {
    let kind = TxKind::parse(&row.kind)
        .ok_or_else(|| Error::storage(format!("unknown transaction type: {}", row.kind)))?;
    let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
        .map_err(|e| Error::storage(format!("bad timestamp {:?}: {}", row.timestamp, e)))?
        .with_timezone(&Utc);
    Ok(HistoryEntry {
        owner: UserKey::new(&row.name),
        kind,
        amount: parse_decimal(&row.amount, "Amount")?,
        resulting_balance: parse_decimal(&row.balance, "Balance")?,
        timestamp,
        category: row.category,
        note: row.note,
    })
}

fn parse_decimal(value: &str, column: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .map_err(|e| Error::storage(format!("bad {column} value {value:?}: {e}")))
}

fn file_has_content(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

fn open_for_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}
