//! SQLite repository implementation
//!
//! Row-level reads and writes against a mapped layout. Table and column
//! names always come from the layout and are quoted; values are always
//! bound parameters.

#![allow(clippy::result_large_err)]

use crate::errors::{decode_error, from_rusqlite, Result};
use polymap_core::mapping::{quote_ident, SecondaryTable, TableLayout};
use polymap_core::Discriminator;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

/// SQLite repository for rows of the mapped hierarchy
pub struct SqliteRepo;

impl SqliteRepo {
    /// Insert the shared-table row carrying id and discriminator
    pub fn insert_primary_row(
        conn: &Connection,
        layout: &TableLayout,
        id: Uuid,
        discriminator: Discriminator,
    ) -> Result<()> {
        let primary = layout.primary();
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            quote_ident(&primary.table.name),
            quote_ident(&primary.id_column),
            quote_ident(&primary.discriminator_column),
        );

        conn.execute(&sql, rusqlite::params![id.to_string(), discriminator.as_str()])
            .map_err(|e| {
                from_rusqlite(e)
                    .with_entity_id(id.to_string())
                    .with_table(primary.table.name.clone())
                    .with_discriminator(discriminator.as_str())
            })?;

        Ok(())
    }

    /// Insert one secondary-table row linking `id` to `target`
    pub fn insert_secondary_row(
        conn: &Connection,
        table: &SecondaryTable,
        id: Uuid,
        target: Uuid,
    ) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            quote_ident(table.name()),
            quote_ident(&table.key_column),
            quote_ident(&table.reference_column),
        );

        conn.execute(&sql, rusqlite::params![id.to_string(), target.to_string()])
            .map_err(|e| {
                from_rusqlite(e)
                    .with_entity_id(id.to_string())
                    .with_table(table.name())
            })?;

        Ok(())
    }

    /// Raw discriminator value stored for `id`, if the row exists
    ///
    /// The value is returned unparsed so callers can report values outside
    /// the closed set.
    pub fn find_discriminator(
        conn: &Connection,
        layout: &TableLayout,
        id: Uuid,
    ) -> Result<Option<String>> {
        let primary = layout.primary();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            quote_ident(&primary.discriminator_column),
            quote_ident(&primary.table.name),
            quote_ident(&primary.id_column),
        );

        conn.query_row(&sql, [id.to_string()], |row| row.get(0))
            .optional()
            .map_err(from_rusqlite)
    }

    /// Reference stored in `table` for the owning row `id`
    pub fn find_reference(
        conn: &Connection,
        table: &SecondaryTable,
        id: Uuid,
    ) -> Result<Option<Uuid>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            quote_ident(&table.reference_column),
            quote_ident(table.name()),
            quote_ident(&table.key_column),
        );

        let raw: Option<String> = conn
            .query_row(&sql, [id.to_string()], |row| row.get(0))
            .optional()
            .map_err(from_rusqlite)?;

        raw.map(|value| parse_uuid(table.name(), &table.reference_column, &value))
            .transpose()
    }

    /// Owning row whose reference in `table` points at `target`
    ///
    /// Only meaningful for one-to-one tables, where at most one row matches.
    pub fn find_inverse(
        conn: &Connection,
        table: &SecondaryTable,
        target: Uuid,
    ) -> Result<Option<Uuid>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            quote_ident(&table.key_column),
            quote_ident(table.name()),
            quote_ident(&table.reference_column),
        );

        let raw: Option<String> = conn
            .query_row(&sql, [target.to_string()], |row| row.get(0))
            .optional()
            .map_err(from_rusqlite)?;

        raw.map(|value| parse_uuid(table.name(), &table.key_column, &value))
            .transpose()
    }

    /// Every entity id in the shared table, in insertion order
    pub fn list_ids(conn: &Connection, layout: &TableLayout) -> Result<Vec<Uuid>> {
        let primary = layout.primary();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            quote_ident(&primary.id_column),
            quote_ident(&primary.table.name),
        );

        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        raw.iter()
            .map(|value| parse_uuid(&primary.table.name, &primary.id_column, value))
            .collect()
    }

    /// Whether a shared-table row exists for `id`
    pub fn exists(conn: &Connection, layout: &TableLayout, id: Uuid) -> Result<bool> {
        Ok(Self::find_discriminator(conn, layout, id)?.is_some())
    }

    /// Number of rows in a table
    pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        conn.query_row(&sql, [], |row| row.get(0))
            .map_err(|e| from_rusqlite(e).with_table(table))
    }
}

fn parse_uuid(table: &str, column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|_| decode_error(table, column, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use polymap_core::mapping::standard_layout;
    use polymap_core::ExErrorKind;

    fn setup() -> (Connection, TableLayout) {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::db::configure(&conn, false).unwrap();
        let layout = standard_layout().unwrap();
        apply_migrations(&mut conn, &layout).unwrap();
        (conn, layout)
    }

    #[test]
    fn test_primary_row_round_trip() {
        let (conn, layout) = setup();
        let id = Uuid::new_v4();

        SqliteRepo::insert_primary_row(&conn, &layout, id, Discriminator::Pending).unwrap();

        assert_eq!(
            SqliteRepo::find_discriminator(&conn, &layout, id).unwrap(),
            Some("PENDING_ENTITY".to_string())
        );
        assert!(SqliteRepo::exists(&conn, &layout, id).unwrap());
        assert!(!SqliteRepo::exists(&conn, &layout, Uuid::new_v4()).unwrap());
    }

    #[test]
    fn test_secondary_row_and_inverse_lookup() {
        let (conn, layout) = setup();
        let pending = Uuid::new_v4();
        let posted = Uuid::new_v4();
        let table = layout.secondary_for("ENTITY").unwrap();

        SqliteRepo::insert_primary_row(&conn, &layout, pending, Discriminator::Pending).unwrap();
        SqliteRepo::insert_primary_row(&conn, &layout, posted, Discriminator::Posted).unwrap();
        SqliteRepo::insert_secondary_row(&conn, table, posted, pending).unwrap();

        assert_eq!(
            SqliteRepo::find_reference(&conn, table, posted).unwrap(),
            Some(pending)
        );
        assert_eq!(
            SqliteRepo::find_inverse(&conn, table, pending).unwrap(),
            Some(posted)
        );
        assert_eq!(SqliteRepo::find_reference(&conn, table, pending).unwrap(), None);
    }

    #[test]
    fn test_secondary_row_requires_existing_target() {
        let (conn, layout) = setup();
        let posted = Uuid::new_v4();
        let table = layout.secondary_for("ENTITY").unwrap();
        SqliteRepo::insert_primary_row(&conn, &layout, posted, Discriminator::Posted).unwrap();

        let err = SqliteRepo::insert_secondary_row(&conn, table, posted, Uuid::new_v4())
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
        assert_eq!(err.table(), Some("ENTITY_FULFILLMENT"));
    }

    #[test]
    fn test_list_ids_in_insertion_order() {
        let (conn, layout) = setup();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            SqliteRepo::insert_primary_row(&conn, &layout, *id, Discriminator::Pending).unwrap();
        }

        assert_eq!(SqliteRepo::list_ids(&conn, &layout).unwrap(), ids);
        assert_eq!(SqliteRepo::count_rows(&conn, "ENTITY").unwrap(), 3);
    }

    #[test]
    fn test_non_uuid_reference_is_a_decode_error() {
        let (conn, layout) = setup();
        let table = layout.secondary_for("EXCLUSION").unwrap();
        let id = Uuid::new_v4();
        conn.pragma_update(None, "foreign_keys", "OFF").unwrap();
        conn.execute(
            "INSERT INTO COMPENSATING_ENTITY (ENTITY_ID, COMPENSATING_ENTITY_ID) VALUES (?1, 'not-a-uuid')",
            [id.to_string()],
        )
        .unwrap();

        let err = SqliteRepo::find_reference(&conn, table, id).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Serialization);
    }
}
