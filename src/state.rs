//! Transport-agnostic application state shared by the API router,
//! the WebSocket feed, and background work.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config;
use crate::db::{self, DatabaseError};
use crate::realtime::ChangeHub;

/// Shared state. Wrapped in `Arc` at startup so the axum router and
/// the WebSocket tasks share the same instance.
///
/// SQLite access is serialized behind a mutex; every operation is a
/// short request/response call, so contention stays low.
pub struct AppState {
    conn: Mutex<Connection>,
    pub hub: ChangeHub,
    pub data_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Database lock poisoned")]
    LockPoisoned,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AppState {
    /// Open (or create) the on-disk database and build the state.
    pub fn open() -> Result<Self, StateError> {
        let data_dir = config::app_data_dir();
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            StateError::Database(DatabaseError::ConstraintViolation(format!(
                "cannot create data dir: {e}"
            )))
        })?;
        let conn = db::open_database(&config::database_path())?;
        Ok(Self {
            conn: Mutex::new(conn),
            hub: ChangeHub::new(),
            data_dir,
        })
    }

    /// In-memory state for tests.
    pub fn open_in_memory() -> Result<Self, StateError> {
        let conn = db::open_memory_database()?;
        Ok(Self {
            conn: Mutex::new(conn),
            hub: ChangeHub::new(),
            data_dir: std::env::temp_dir(),
        })
    }

    /// Lock the database connection for a request/response call.
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, StateError> {
        self.conn.lock().map_err(|_| StateError::LockPoisoned)
    }
}
