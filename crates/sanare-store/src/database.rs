//! Database handle.
//!
//! [`Database`] wraps a single [`rusqlite::Connection`] and runs schema
//! migrations before handing it out. The process entry point constructs one
//! handle and injects it into the HTTP layer; no module holds a process-wide
//! singleton.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::Result;
use crate::migrations;

/// An open, migrated SQLite database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file at `path` and migrate it to the
    /// current schema version. The parent directory must already exist.
    pub fn open_at(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "opening database");

        Self::prepare(Connection::open(path)?)
    }

    /// Open an in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// The underlying connection. The typed CRUD helpers in this crate are
    /// the intended surface; this exists for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Filesystem path of the open database (`None` for in-memory).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}
