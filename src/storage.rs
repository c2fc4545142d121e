//! SQLite-backed record store.
//!
//! Rows are appended to the `monitor_data` table, which is created on open if
//! it does not exist yet. The schema is never altered afterwards.

use crate::core::{RecordStore, Sample};
use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const CREATE_TABLE_SQL: &str = "
CREATE TABLE IF NOT EXISTS monitor_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    time TEXT,
    cpu_usage REAL,
    ram_usage REAL,
    disc_usage REAL
)";

const INSERT_SQL: &str =
    "INSERT INTO monitor_data (time, cpu_usage, ram_usage, disc_usage) VALUES (?1, ?2, ?3, ?4)";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("record store is closed")]
    Closed,
}

/// A [`RecordStore`] writing to an embedded SQLite database.
///
/// Every append runs in autocommit mode, so a row is committed before
/// `append` returns.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Option<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and provisions the table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened record store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_TABLE_SQL)?;
        Ok(Self { conn: Some(conn) })
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

impl RecordStore for SqliteStore {
    fn append(&mut self, timestamp: &str, sample: &Sample) -> Result<(), StoreError> {
        let conn = self.conn.as_ref().ok_or(StoreError::Closed)?;
        let mut stmt = conn.prepare_cached(INSERT_SQL)?;
        stmt.execute(params![
            timestamp,
            sample.cpu_percent,
            sample.ram_percent,
            sample.disk_percent
        ])?;
        debug!(timestamp, "Appended sample");
        Ok(())
    }

    fn close(&mut self) -> Result<(), StoreError> {
        match self.conn.take() {
            Some(conn) => {
                conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
                info!("Closed record store");
                Ok(())
            }
            None => Ok(()),
        }
    }
}
