//! Key-value persistence backends.
//!
//! The record store only needs two operations: fetch the string stored under
//! a key, and overwrite it. [`SqliteBackend`] keeps every key in one
//! `key_values` table.

mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Fault raised by a backend `get` or `set`.
#[derive(Debug, thiserror::Error)]
pub(crate) enum BackendError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("connection lock poisoned")]
    Poisoned,
}

/// String storage addressed by key.
pub(crate) trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, BackendError>;
    fn set(&self, key: &str, value: &str) -> std::result::Result<(), BackendError>;
}

pub(crate) struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set database pragmas")?;
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        init_schema(&mut conn).context("Failed to initialise database schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, BackendError> {
        self.conn.lock().map_err(|_| BackendError::Poisoned)
    }
}

/// Create the tables on a fresh database, and refuse files written by a newer schema.
fn init_schema(conn: &mut Connection) -> Result<()> {
    let has_version_table: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !has_version_table {
        let tx = conn.transaction()?;
        tx.execute_batch(schema::SCHEMA_V1)?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![schema::CURRENT_VERSION],
        )?;
        tx.commit()?;
        return Ok(());
    }

    let stored: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    match stored {
        Some(version) if version > schema::CURRENT_VERSION => anyhow::bail!(
            "Database schema version {version} is newer than supported version {}",
            schema::CURRENT_VERSION
        ),
        Some(_) => Ok(()),
        None => {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            Ok(())
        }
    }
}

impl KvBackend for SqliteBackend {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, BackendError> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM key_values WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), BackendError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO key_values (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}
