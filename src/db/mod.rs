//! SQLite-backed storage for the emission ledger.
//!
//! The database lives at `~/.carbonledger/carbonledger.db` and holds
//! three row families: reference data (emission factors), the
//! append-mostly transactional ledger (emission records + detail
//! payloads) and the fully-rebuildable monthly summary cache. The
//! summary table is a materialized view, never a source of truth —
//! it is safe to drop and rebuild from the records at any time.

use std::path::PathBuf;

use rusqlite::Connection;

use crate::error::CoreError;

pub mod types;
pub use types::*;

pub mod facilities;
pub mod factors;
pub mod organizations;
pub mod records;
pub mod summaries;

pub struct EmissionDb {
    conn: Connection,
}

impl EmissionDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so concurrent
    /// ingestions into the same database serialize at the storage
    /// boundary — the core imposes no locking of its own.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&Self) -> Result<T, CoreError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(val) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at the default path and apply the
    /// schema.
    pub fn open() -> Result<Self, CoreError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, CoreError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CoreError::Validation(format!(
                        "failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(CoreError::Migration)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.carbonledger/carbonledger.db`.
    fn db_path() -> Result<PathBuf, CoreError> {
        let home = dirs::home_dir().ok_or_else(|| {
            CoreError::Validation("home directory not found".to_string())
        })?;
        Ok(home.join(".carbonledger").join("carbonledger.db"))
    }
}

// =============================================================================
// Shared test utilities
// =============================================================================
