//! Graph persister
//!
//! Writes a whole entity graph as one unit of work: one transaction, rows in
//! foreign-key dependency order, nothing visible unless everything succeeds.

#![allow(clippy::result_large_err)]

use std::time::Instant;

use crate::errors::{from_rusqlite, Result};
use crate::repo::SqliteRepo;
use polymap_core::errors::{ExError, ExErrorKind, MapError};
use polymap_core::mapping::{SecondaryTable, TableLayout};
use polymap_core::{insertion_order, log_op_end, log_op_error, log_op_start, reachable_from};
use polymap_core::{Discriminator, EntityGraph};
use polymap_core_types::UnitOfWorkId;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of one committed unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub uow_id: UnitOfWorkId,
    /// Entity ids in the order their rows were written
    pub order: Vec<Uuid>,
    pub primary_rows: usize,
    pub secondary_rows: usize,
}

/// Persist every entity of `graph` in one transaction
///
/// Each entity gets its shared-table row, then its secondary-table row if
/// and only if its owning reference is set.
///
/// # Errors
///
/// - `CycleDetected` if no insertion order exists
/// - `InvalidTargetKind` if a typed reference points at the wrong variant,
///   whether the target is in the graph or already stored
/// - `ConstraintViolation` if a row already exists or a reference names a
///   row that is neither in the graph nor stored
///
/// On any error the transaction is rolled back and nothing is written.
pub fn persist_graph(
    conn: &mut Connection,
    layout: &TableLayout,
    graph: &EntityGraph,
) -> Result<PersistReport> {
    let uow_id = UnitOfWorkId::new();
    let span = tracing::info_span!("unit_of_work", uow_id = %uow_id);
    let _guard = span.enter();

    let start = Instant::now();
    log_op_start!("persist_graph", graph_len = graph.len());

    match write_graph(conn, layout, graph, uow_id) {
        Ok(report) => {
            log_op_end!(
                "persist_graph",
                duration_ms = start.elapsed().as_millis() as u64,
                row_count = report.primary_rows + report.secondary_rows
            );
            Ok(report)
        }
        Err(err) => {
            log_op_error!(
                "persist_graph",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}

/// Persist `root` and everything it transitively owns a reference to
///
/// Entities of `graph` not reachable from `root` are left alone.
///
/// # Errors
///
/// `NotFound` if `root` is not part of `graph`, otherwise as
/// [`persist_graph`].
pub fn persist_reachable(
    conn: &mut Connection,
    layout: &TableLayout,
    graph: &EntityGraph,
    root: Uuid,
) -> Result<PersistReport> {
    let sub = reachable_from(graph, root)?;
    tracing::debug!(
        entity_id = %root,
        graph_len = sub.len(),
        skipped = graph.len() - sub.len(),
        "Cascading persist from root"
    );
    persist_graph(conn, layout, &sub)
}

fn write_graph(
    conn: &mut Connection,
    layout: &TableLayout,
    graph: &EntityGraph,
    uow_id: UnitOfWorkId,
) -> Result<PersistReport> {
    layout.ensure_covers(Discriminator::ALL.iter().map(|d| d.as_str()))?;

    let order = insertion_order(graph)?;

    // Take the write lock up front so stored targets cannot change between
    // the type check and the inserts
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;
    check_targets(&tx, layout, graph)?;
    let mut primary_rows = 0;
    let mut secondary_rows = 0;

    for &id in &order {
        let entity = graph.get(id).ok_or_else(|| {
            ExError::new(ExErrorKind::Internal)
                .with_op("persist_graph")
                .with_entity_id(id.to_string())
                .with_message("ordered id is missing from the graph")
        })?;
        let discriminator = entity.discriminator();

        SqliteRepo::insert_primary_row(&tx, layout, id, discriminator)?;
        primary_rows += 1;

        if let Some(target) = entity.owning_reference() {
            let table = owned_table(layout, discriminator)?;
            SqliteRepo::insert_secondary_row(&tx, table, id, target)?;
            secondary_rows += 1;
        }
    }

    tx.commit().map_err(from_rusqlite)?;

    Ok(PersistReport {
        uow_id,
        order,
        primary_rows,
        secondary_rows,
    })
}

/// Type-check every owning reference before any row is written
///
/// Runs inside the unit of work's transaction.
///
/// In-graph targets are checked against the graph. Stored targets are
/// checked against their stored discriminator. Targets found in neither are
/// left for the foreign key to reject.
fn check_targets(conn: &Connection, layout: &TableLayout, graph: &EntityGraph) -> Result<()> {
    for entity in graph.iter() {
        let Some(target) = entity.owning_reference() else {
            continue;
        };
        let table = owned_table(layout, entity.discriminator())?;

        let actual = match graph.get(target) {
            Some(t) => Some(t.discriminator().as_str().to_string()),
            None => SqliteRepo::find_discriminator(conn, layout, target)?,
        };
        let Some(actual) = actual else {
            continue;
        };

        if !table.target.accepts(&actual) {
            return Err(MapError::InvalidTargetKind {
                entity_id: entity.id().to_string(),
                target_id: target.to_string(),
                expected: table.target.to_string(),
                actual,
            }
            .into());
        }
    }
    Ok(())
}

fn owned_table(layout: &TableLayout, discriminator: Discriminator) -> Result<&SecondaryTable> {
    layout.secondary_for(discriminator.as_str()).ok_or_else(|| {
        MapError::MissingVariant {
            discriminator: discriminator.as_str().to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use polymap_core::mapping::standard_layout;
    use polymap_core::{ExclusionEntity, PendingEntity, PostedEntity};

    fn setup() -> (Connection, TableLayout) {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::db::configure(&conn, false).unwrap();
        let layout = standard_layout().unwrap();
        apply_migrations(&mut conn, &layout).unwrap();
        (conn, layout)
    }

    #[test]
    fn test_persist_counts_rows() {
        let (mut conn, layout) = setup();
        let mut graph = EntityGraph::new();
        let pending = graph.insert(PendingEntity::new()).unwrap();
        graph.insert(PostedEntity::new().fulfilling(pending)).unwrap();
        graph.insert(PostedEntity::new()).unwrap();

        let report = persist_graph(&mut conn, &layout, &graph).unwrap();

        assert_eq!(report.primary_rows, 3);
        assert_eq!(report.secondary_rows, 1);
        assert_eq!(report.order.len(), 3);
    }

    #[test]
    fn test_posted_cannot_fulfil_a_posted() {
        let (mut conn, layout) = setup();
        let mut graph = EntityGraph::new();
        let other = graph.insert(PostedEntity::new()).unwrap();
        graph.insert(PostedEntity::new().fulfilling(other)).unwrap();

        let err = persist_graph(&mut conn, &layout, &graph).unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::InvalidTargetKind);
        assert_eq!(SqliteRepo::count_rows(&conn, "ENTITY").unwrap(), 0);
    }

    #[test]
    fn test_stored_target_is_type_checked() {
        let (mut conn, layout) = setup();
        let mut first = EntityGraph::new();
        let exclusion = first
            .insert(ExclusionEntity::new(Uuid::new_v4(), None))
            .unwrap();
        persist_graph(&mut conn, &layout, &first).unwrap();

        let mut second = EntityGraph::new();
        second.insert(PostedEntity::new().fulfilling(exclusion)).unwrap();
        let err = persist_graph(&mut conn, &layout, &second).unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::InvalidTargetKind);
    }

    #[test]
    fn test_stored_targets_are_checked_under_the_write_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let layout = standard_layout().unwrap();

        let mut conn = Connection::open(&path).unwrap();
        crate::db::configure(&conn, true).unwrap();
        apply_migrations(&mut conn, &layout).unwrap();
        conn.busy_timeout(std::time::Duration::ZERO).unwrap();

        let mut first = EntityGraph::new();
        let exclusion = first
            .insert(ExclusionEntity::new(Uuid::new_v4(), None))
            .unwrap();
        persist_graph(&mut conn, &layout, &first).unwrap();

        let mut second = EntityGraph::new();
        second.insert(PostedEntity::new().fulfilling(exclusion)).unwrap();

        // Another writer holds the lock: nothing is read or checked
        let other = Connection::open(&path).unwrap();
        other.execute_batch("BEGIN IMMEDIATE").unwrap();
        let err = persist_graph(&mut conn, &layout, &second).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Persistence);

        other.execute_batch("ROLLBACK").unwrap();
        let err = persist_graph(&mut conn, &layout, &second).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidTargetKind);
        assert_eq!(SqliteRepo::count_rows(&conn, "ENTITY").unwrap(), 1);
    }

    #[test]
    fn test_persist_reachable_skips_unrelated() {
        let (mut conn, layout) = setup();
        let mut graph = EntityGraph::new();
        let pending = graph.insert(PendingEntity::new()).unwrap();
        let exclusion = graph
            .insert(ExclusionEntity::new(Uuid::new_v4(), Some(pending)))
            .unwrap();
        graph.insert(PendingEntity::new()).unwrap();

        let report = persist_reachable(&mut conn, &layout, &graph, exclusion).unwrap();

        assert_eq!(report.order, vec![pending, exclusion]);
        assert_eq!(SqliteRepo::count_rows(&conn, "ENTITY").unwrap(), 2);
    }
}
