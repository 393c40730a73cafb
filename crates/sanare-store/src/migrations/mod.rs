//! Schema migrations.
//!
//! The schema version lives in SQLite's `user_version` pragma. On every open
//! the runner applies, in order, each migration whose version is above the
//! stored one, stamping the new version after each step so a migration never
//! runs twice.

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type MigrationFn = fn(&Connection) -> std::result::Result<(), rusqlite::Error>;

/// Ordered list of schema migrations. Append here when the schema changes;
/// versions must be contiguous and ascending.
const MIGRATIONS: &[(u32, &str, MigrationFn)] = &[(1, "v001_initial", v001_initial::up)];

/// Bring the connected database up to the latest schema version.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let applied: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let latest = MIGRATIONS.last().map(|(v, _, _)| *v).unwrap_or(0);

    if applied > latest {
        return Err(StoreError::Migration(format!(
            "database schema v{applied} is newer than this build supports (v{latest})"
        )));
    }

    for (version, name, up) in MIGRATIONS {
        if *version <= applied {
            continue;
        }
        tracing::info!(version = *version, name = %name, "applying schema migration");
        up(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", *version)?;
    }

    Ok(())
}
