// Integration tests for the migration framework
// Schema is generated from the mapped layout and recorded with checksums

use polymap_core::mapping::{standard_layout, RefTarget, ReferenceDecl, SecondaryTableDecl};
use polymap_core::{map_hierarchy, standard_hierarchy, ExErrorKind};
use rusqlite::Connection;

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    // Given: An empty SQLite database
    let mut conn = Connection::open_in_memory().unwrap();

    // When: Migrations are applied for the standard layout
    let result =
        polymap_store::migrations::apply_migrations(&mut conn, &standard_layout().unwrap());

    // Then: All migrations succeed
    assert!(result.is_ok(), "Migrations should succeed: {:?}", result.err());

    // And: The mapped tables plus the version table exist
    assert_eq!(
        get_table_names(&conn),
        vec![
            "COMPENSATING_ENTITY",
            "ENTITY",
            "ENTITY_FULFILLMENT",
            "schema_version"
        ]
    );
}

#[test]
fn test_migrations_are_recorded_in_order() {
    // Given: A migrated database
    let mut conn = Connection::open_in_memory().unwrap();
    let layout = standard_layout().unwrap();
    polymap_store::migrations::apply_migrations(&mut conn, &layout).unwrap();

    // Then: One migration per table is recorded, primary table first
    assert_eq!(
        polymap_store::migrations::applied_migrations(&conn).unwrap(),
        vec!["001_entity", "002_entity_fulfillment", "003_compensating_entity"]
    );

    // And: Every recorded checksum matches the planned SQL
    for migration in polymap_store::migrations::plan_migrations(&layout) {
        let checksum: String = conn
            .query_row(
                "SELECT checksum FROM schema_version WHERE migration_id = ?1",
                [&migration.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(
            checksum,
            polymap_store::migrations::compute_checksum(&migration.sql)
        );
    }
}

#[test]
fn test_changed_layout_is_refused() {
    // Given: A database migrated with the standard layout
    let mut conn = Connection::open_in_memory().unwrap();
    polymap_store::migrations::apply_migrations(&mut conn, &standard_layout().unwrap()).unwrap();

    // When: A layout that changes an existing table is applied
    let mut decl = standard_hierarchy();
    decl.variants[2].secondary_table = Some(SecondaryTableDecl {
        name: "COMPENSATING_ENTITY".to_string(),
        key_column: "ENTITY_ID".to_string(),
        reference: ReferenceDecl {
            column: "COMPENSATING_ENTITY_ID".to_string(),
            target: RefTarget::Base,
            unique: true,
        },
    });
    let changed = map_hierarchy(&decl).unwrap();
    let err = polymap_store::migrations::apply_migrations(&mut conn, &changed).unwrap_err();

    // Then: The checksum mismatch is reported and nothing is altered
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    assert!(err.message().contains("003_compensating_entity"));
}

#[test]
fn test_indexes_created_for_many_to_one_reference() {
    let mut conn = Connection::open_in_memory().unwrap();
    polymap_store::migrations::apply_migrations(&mut conn, &standard_layout().unwrap()).unwrap();

    let index: String = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='COMPENSATING_ENTITY' AND name LIKE 'idx_%'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(index, "idx_compensating_entity_compensating_entity_id");
}
