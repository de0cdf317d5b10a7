//! Session: one connection plus the mapped layout
//!
//! Opening a session configures the connection and brings the schema up to
//! date. Each `persist*` call is one unit of work; the connection is closed
//! when the session drops.

#![allow(clippy::result_large_err)]

use std::path::Path;

use crate::db;
use crate::errors::{from_rusqlite, Result};
use crate::migrations::apply_migrations;
use crate::repo::persist::{persist_graph, persist_reachable, PersistReport};
use crate::repo::{hydration, SqliteRepo};
use polymap_core::errors::{ExError, ExErrorKind};
use polymap_core::mapping::{standard_layout, TableLayout};
use polymap_core::{EntityGraph, LoadedGraph};
use rusqlite::Connection;
use uuid::Uuid;

pub struct Session {
    conn: Connection,
    layout: TableLayout,
}

impl Session {
    /// Open (or create) a file database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = db::open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "Opened database");
        Self::from_connection(conn, true)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?, false)
    }

    fn from_connection(mut conn: Connection, file_backed: bool) -> Result<Self> {
        db::configure(&conn, file_backed)?;
        let layout = standard_layout()?;
        apply_migrations(&mut conn, &layout)?;
        Ok(Self { conn, layout })
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Underlying connection, for raw inspection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Persist a whole graph as one unit of work
    pub fn persist(&mut self, graph: &EntityGraph) -> Result<PersistReport> {
        persist_graph(&mut self.conn, &self.layout, graph)
    }

    /// Persist `root` and what it owns references to, as one unit of work
    pub fn persist_reachable(&mut self, graph: &EntityGraph, root: Uuid) -> Result<PersistReport> {
        persist_reachable(&mut self.conn, &self.layout, graph, root)
    }

    /// Load the graph rooted at `id`
    ///
    /// All reads run inside one transaction so the graph is a consistent
    /// snapshot.
    pub fn find(&self, id: Uuid) -> Result<Option<LoadedGraph>> {
        let tx = self.conn.unchecked_transaction().map_err(from_rusqlite)?;
        let loaded = hydration::load_graph(&tx, &self.layout, id)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(loaded)
    }

    /// Load every stored entity
    pub fn find_all(&self) -> Result<EntityGraph> {
        let tx = self.conn.unchecked_transaction().map_err(from_rusqlite)?;
        let graph = hydration::load_all(&tx, &self.layout)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(graph)
    }

    pub fn exists(&self, id: Uuid) -> Result<bool> {
        SqliteRepo::exists(&self.conn, &self.layout, id)
    }

    /// Row count of one of the mapped tables
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `table` is not part of the layout.
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        let Some(name) = self
            .layout
            .table_names()
            .into_iter()
            .find(|t| t.eq_ignore_ascii_case(table))
        else {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("count_rows")
                .with_table(table)
                .with_message(format!("{} is not a mapped table", table)));
        };
        SqliteRepo::count_rows(&self.conn, name)
    }

    /// DDL of the mapped layout, primary table first
    pub fn schema_sql(&self) -> Vec<String> {
        self.layout.create_statements()
    }
}
