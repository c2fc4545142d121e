//! An in-memory record store with failure injection.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use sysrecord::{storage::StoreError, RecordStore, Sample};

#[derive(Debug, Default)]
struct MemoryStoreState {
    rows: Vec<(String, Sample)>,
    attempts: usize,
    fail_on_attempts: HashSet<usize>,
    fail_close: bool,
    close_calls: usize,
}

/// A [`RecordStore`] that keeps rows in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryStoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `n`th append attempt (1-based) fail.
    pub fn fail_on_attempt(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_on_attempts.insert(n);
        self
    }

    pub fn fail_close(self) -> Self {
        self.state.lock().unwrap().fail_close = true;
        self
    }

    pub fn rows(&self) -> Vec<(String, Sample)> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }
}

impl RecordStore for MemoryStore {
    fn append(&mut self, timestamp: &str, sample: &Sample) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.attempts += 1;
        let attempt = state.attempts;
        if state.fail_on_attempts.contains(&attempt) {
            return Err(StoreError::Sqlite(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_FULL),
                Some("simulated disk full".to_string()),
            )));
        }
        state.rows.push((timestamp.to_string(), *sample));
        Ok(())
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.close_calls += 1;
        if state.fail_close {
            return Err(StoreError::Sqlite(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
                Some("simulated busy database".to_string()),
            )));
        }
        Ok(())
    }
}
