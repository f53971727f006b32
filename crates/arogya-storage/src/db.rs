//! SQLite handle shared by every repository.
//!
//! One connection behind a mutex, opened in WAL mode with foreign keys
//! enforced so a message can never reference a missing conversation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use arogya_core::error::ArogyaError;

use crate::migrations;

const FILE_PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA foreign_keys = ON;";

const MEMORY_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

/// Migrated SQLite database.
///
/// `rusqlite::Connection` is not `Sync`, so access goes through
/// [`Database::with_conn`] / [`Database::with_conn_mut`].
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database file at `path`, creating parent
    /// directories and applying pending migrations.
    pub fn new(path: &Path) -> Result<Self, ArogyaError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| {
            ArogyaError::Storage(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let db = Self::init(conn, FILE_PRAGMAS, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "Database ready");
        Ok(db)
    }

    /// Private in-memory database, used by tests.
    pub fn in_memory() -> Result<Self, ArogyaError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ArogyaError::Storage(format!("Failed to open in-memory db: {}", e)))?;
        Self::init(conn, MEMORY_PRAGMAS, None)
    }

    fn init(conn: Connection, pragmas: &str, path: Option<PathBuf>) -> Result<Self, ArogyaError> {
        conn.execute_batch(pragmas)
            .map_err(|e| ArogyaError::Storage(format!("Failed to set pragmas: {}", e)))?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Backing file, or `None` for an in-memory database.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against the connection while holding the lock.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ArogyaError>
    where
        F: FnOnce(&Connection) -> Result<T, ArogyaError>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| ArogyaError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&guard)
    }

    /// Like [`Database::with_conn`], with mutable access for transactions.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, ArogyaError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ArogyaError>,
    {
        let mut guard = self
            .conn
            .lock()
            .map_err(|e| ArogyaError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&mut guard)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}
