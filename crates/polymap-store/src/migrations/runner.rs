//! Migration runner
//!
//! Applies planned migrations with checksums and idempotency

use std::time::Instant;

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::plan::plan_migrations;
use polymap_core::mapping::TableLayout;
use polymap_core::{log_op_end, log_op_error, log_op_start};
use rusqlite::{Connection, OptionalExtension};

/// Apply all pending migrations for `layout`
///
/// Already-applied migrations are skipped when their checksum matches.
///
/// # Errors
///
/// - `ConstraintViolation` if a recorded checksum differs from the layout's
/// - `Persistence` if any DDL fails; that migration is rolled back
pub fn apply_migrations(conn: &mut Connection, layout: &TableLayout) -> Result<()> {
    let start = Instant::now();
    log_op_start!("apply_migrations");

    match apply_all(conn, layout) {
        Ok(applied) => {
            log_op_end!(
                "apply_migrations",
                duration_ms = start.elapsed().as_millis() as u64,
                row_count = applied
            );
            Ok(())
        }
        Err(err) => {
            log_op_error!(
                "apply_migrations",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}

/// Ids of applied migrations, in apply order
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT migration_id FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let ids = stmt
        .query_map([], |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(from_rusqlite)?;
    Ok(ids)
}

fn apply_all(conn: &mut Connection, layout: &TableLayout) -> Result<usize> {
    create_schema_version_table(conn)?;

    let mut applied = 0;
    for migration in plan_migrations(layout) {
        if apply_migration(conn, &migration.id, &migration.sql)? {
            applied += 1;
        }
    }
    Ok(applied)
}

fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT NOT NULL
        )",
        [],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

/// Apply one migration; returns false if it was already applied
fn apply_migration(conn: &mut Connection, migration_id: &str, sql: &str) -> Result<bool> {
    let checksum = compute_checksum(sql);

    let recorded: Option<String> = conn
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = ?1",
            [migration_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;

    if let Some(recorded) = recorded {
        if recorded != checksum {
            return Err(checksum_mismatch(migration_id, &recorded, &checksum));
        }
        return Ok(false);
    }

    let tx = conn.transaction().map_err(from_rusqlite)?;

    tx.execute_batch(sql)
        .map_err(|e| migration_error(migration_id, &e.to_string()))?;

    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?1, ?2, ?3)",
        rusqlite::params![migration_id, chrono::Utc::now().timestamp(), checksum],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;

    tracing::debug!(migration_id, "Applied migration");
    Ok(true)
}
