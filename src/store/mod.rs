// src/store/mod.rs
//! The local relational mirror: logical databases, records, relation edges
//! and the run/event logs of every workflow that touches them.
//!
//! One `Store` wraps one SQLite connection. Writers serialize on the
//! connection mutex; each per-database snapshot lands in one transaction.

mod models;
mod queries;
mod runs;
mod schema;
mod snapshot;

pub use models::{
    DatabaseSnapshot, DatabaseSnapshotSummary, LogicalDatabaseRow, RecordRow, RelationMap,
    RelationRow, ReviewEventRow, ReviewRunRow, ReviewRunTotals, ReviewWorkflow, RunStatus,
    StoreStats, StoredRecord, SyncEventRow, SyncRunConfig, SyncRunRow, SyncRunTotals,
};

use crate::constants::{STORE_BUSY_TIMEOUT, STORE_OPEN_ATTEMPTS, STORE_OPEN_RETRY_DELAY};
use crate::error::AppError;
use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode};
use std::path::Path;

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if needed) the store at `path` and bootstraps the schema.
    ///
    /// Another process holding the file locked is retried a bounded number of
    /// times before giving up.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut attempt = 1;
        loop {
            match Self::connect(Connection::open(path)) {
                Ok(store) => return Ok(store),
                Err(AppError::Storage(err))
                    if is_lock_contention(&err) && attempt < STORE_OPEN_ATTEMPTS =>
                {
                    log::warn!(
                        "Store {} is locked (attempt {}/{}), retrying in {:?}",
                        path.display(),
                        attempt,
                        STORE_OPEN_ATTEMPTS,
                        STORE_OPEN_RETRY_DELAY
                    );
                    std::thread::sleep(STORE_OPEN_RETRY_DELAY);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub fn in_memory() -> Result<Self, AppError> {
        Self::connect(Connection::open_in_memory())
    }

    fn connect(conn: rusqlite::Result<Connection>) -> Result<Self, AppError> {
        let conn = conn?;
        conn.busy_timeout(STORE_BUSY_TIMEOUT)?;
        // In-memory databases answer "memory" here, which is fine.
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(schema::SCHEMA_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn is_lock_contention(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
    )
}

/// Current UTC time as stored in every `*_at` column.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Parses a stored JSON column, tolerating rows written by hand.
pub(crate) fn parse_json_column(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}
