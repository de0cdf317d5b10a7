//! Database connection management

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection for use by a session
///
/// Foreign keys are always enforced; the persister relies on them to reject
/// references to rows that do not exist. WAL is only requested for file
/// databases, in-memory databases ignore it.
pub fn configure(conn: &Connection, file_backed: bool) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(from_rusqlite)?;

    if file_backed {
        let mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
        tracing::debug!(journal_mode = %mode, "Configured journal mode");
    }

    Ok(())
}

/// Whether foreign key enforcement is active on this connection
pub fn foreign_keys_enabled(conn: &Connection) -> Result<bool> {
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .map_err(from_rusqlite)?;
    Ok(enabled == 1)
}
