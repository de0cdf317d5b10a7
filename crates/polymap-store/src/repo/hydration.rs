//! Hydration layer - rebuilds entity graphs from SQLite rows
//!
//! Every row materializes through the loader registered for its own stored
//! discriminator. A reference declared against the base type therefore
//! comes back as whatever concrete variant the target row says it is.
//!
//! Loading walks an explicit worklist: each row is read once and staged
//! with the links it stores, and the links are checked only after the walk
//! has staged everything they point at. Reference depth never grows the
//! call stack.

#![allow(clippy::result_large_err)]

use std::collections::HashMap;
use std::time::Instant;

use crate::errors::Result;
use crate::repo::SqliteRepo;
use polymap_core::errors::{ExError, ExErrorKind, MapError};
use polymap_core::mapping::{SecondaryTable, TableLayout};
use polymap_core::{log_op_end, log_op_error, log_op_start};
use polymap_core::{
    Discriminator, Entity, EntityGraph, ExclusionEntity, LoadedGraph, PendingEntity, PostedEntity,
};
use rusqlite::Connection;
use uuid::Uuid;

/// Reads one concrete variant's rows
type LoadFn = for<'c> fn(&Hydrator<'c>, Uuid) -> Result<Staged<'c>>;

const LOADERS: [(Discriminator, LoadFn); 3] = [
    (Discriminator::Pending, load_pending),
    (Discriminator::Posted, load_posted),
    (Discriminator::Exclusion, load_exclusion),
];

fn loader_for(discriminator: Discriminator) -> Option<LoadFn> {
    LOADERS
        .iter()
        .find(|(d, _)| *d == discriminator)
        .map(|(_, load)| *load)
}

/// Load `id` and everything reachable from it
///
/// Returns `Ok(None)` when no row exists for `id`.
///
/// # Errors
///
/// - `UnknownDiscriminator` if any visited row carries a value outside the
///   closed set
/// - `DanglingReference` if a stored reference names a missing row
/// - `InvalidTargetKind` if a stored typed reference names a row of the
///   wrong variant
pub fn load_graph(
    conn: &Connection,
    layout: &TableLayout,
    id: Uuid,
) -> Result<Option<LoadedGraph>> {
    let start = Instant::now();
    log_op_start!("load_graph", entity_id = %id);

    let result = Hydrator::new(conn, layout).load_rooted(id);
    match &result {
        Ok(loaded) => {
            log_op_end!(
                "load_graph",
                duration_ms = start.elapsed().as_millis() as u64,
                graph_len = loaded.as_ref().map_or(0, LoadedGraph::len)
            );
        }
        Err(err) => {
            log_op_error!(
                "load_graph",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                entity_id = %id
            );
        }
    }
    result
}

/// Load every stored entity into one graph
///
/// Entities appear in the order the loader reached them.
pub fn load_all(conn: &Connection, layout: &TableLayout) -> Result<EntityGraph> {
    let start = Instant::now();
    log_op_start!("load_all");

    let result = SqliteRepo::list_ids(conn, layout).and_then(|ids| {
        let mut hydrator = Hydrator::new(conn, layout);
        for id in ids {
            hydrator.load_from(id)?;
        }
        Ok(hydrator.graph)
    });

    match &result {
        Ok(graph) => {
            log_op_end!(
                "load_all",
                duration_ms = start.elapsed().as_millis() as u64,
                graph_len = graph.len()
            );
        }
        Err(err) => {
            log_op_error!(
                "load_all",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
        }
    }
    result
}

/// Link stored with a row
#[derive(Clone, Copy)]
enum Link<'c> {
    /// The row's own reference column points at `target`
    Reference {
        table: &'c SecondaryTable,
        target: Uuid,
    },
    /// `owner` stores a one-to-one reference to the row
    Inverse {
        table: &'c SecondaryTable,
        owner: Uuid,
    },
}

impl Link<'_> {
    fn next(&self) -> Uuid {
        match *self {
            Link::Reference { target, .. } => target,
            Link::Inverse { owner, .. } => owner,
        }
    }
}

/// Row read from storage but not yet placed in the arena
struct Staged<'c> {
    entity: Entity,
    links: Vec<Link<'c>>,
}

/// Per-load state: the arena doubles as the identity map
struct Hydrator<'c> {
    conn: &'c Connection,
    layout: &'c TableLayout,
    graph: EntityGraph,
    // Rows read by the current walk; each is read once, which breaks the
    // pending/posted cycle
    staged: HashMap<Uuid, Staged<'c>>,
    order: Vec<Uuid>,
}

impl<'c> Hydrator<'c> {
    fn new(conn: &'c Connection, layout: &'c TableLayout) -> Self {
        Self {
            conn,
            layout,
            graph: EntityGraph::new(),
            staged: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn load_rooted(mut self, id: Uuid) -> Result<Option<LoadedGraph>> {
        if !self.load_from(id)? {
            return Ok(None);
        }
        Ok(Some(LoadedGraph::new(id, self.graph)?))
    }

    /// Stage `root` and every row reachable from it, then move them into
    /// the arena; returns false if no row exists for `root`
    fn load_from(&mut self, root: Uuid) -> Result<bool> {
        let mut worklist = vec![root];

        while let Some(id) = worklist.pop() {
            if self.graph.contains(id) || self.staged.contains_key(&id) {
                continue;
            }
            // a missing target surfaces as a dangling link on commit
            let Some(discriminator) = self.read_discriminator(id)? else {
                continue;
            };
            let load = loader_for(discriminator).ok_or_else(|| {
                ExError::new(ExErrorKind::MissingMapping)
                    .with_op("load_graph")
                    .with_discriminator(discriminator.as_str())
                    .with_message("no loader registered")
            })?;

            tracing::trace!(entity_id = %id, discriminator = %discriminator, "Hydrating row");
            let staged = load(self, id)?;
            worklist.extend(staged.links.iter().map(Link::next));
            self.staged.insert(id, staged);
            self.order.push(id);
        }

        self.commit()?;
        Ok(self.graph.contains(root))
    }

    fn read_discriminator(&self, id: Uuid) -> Result<Option<Discriminator>> {
        let Some(raw) = SqliteRepo::find_discriminator(self.conn, self.layout, id)? else {
            return Ok(None);
        };
        let discriminator =
            Discriminator::from_column(&raw).ok_or_else(|| MapError::UnknownDiscriminator {
                entity_id: id.to_string(),
                discriminator: raw.clone(),
            })?;
        Ok(Some(discriminator))
    }

    /// Check every staged link, then insert the staged rows in walk order
    fn commit(&mut self) -> Result<()> {
        let order = std::mem::take(&mut self.order);
        for id in &order {
            if let Some(staged) = self.staged.get(id) {
                for link in &staged.links {
                    self.check(*id, *link)?;
                }
            }
        }
        for id in order {
            if let Some(staged) = self.staged.remove(&id) {
                self.graph.insert(staged.entity)?;
            }
        }
        Ok(())
    }

    fn discriminator_of(&self, id: Uuid) -> Option<Discriminator> {
        self.graph
            .get(id)
            .map(Entity::discriminator)
            .or_else(|| self.staged.get(&id).map(|s| s.entity.discriminator()))
    }

    fn check(&self, id: Uuid, link: Link<'_>) -> Result<()> {
        match link {
            Link::Reference { table, target } => match self.discriminator_of(target) {
                None => Err(MapError::DanglingReference {
                    entity_id: id.to_string(),
                    target_id: target.to_string(),
                    table: table.name().to_string(),
                }
                .into()),
                Some(actual) if !table.target.accepts(actual.as_str()) => {
                    Err(MapError::InvalidTargetKind {
                        entity_id: id.to_string(),
                        target_id: target.to_string(),
                        expected: table.target.to_string(),
                        actual: actual.as_str().to_string(),
                    }
                    .into())
                }
                Some(_) => Ok(()),
            },
            Link::Inverse { table, owner } => match self.discriminator_of(owner) {
                Some(d) if d.as_str() == table.owner => Ok(()),
                Some(d) => Err(MapError::InvalidTargetKind {
                    entity_id: owner.to_string(),
                    target_id: id.to_string(),
                    expected: table.owner.clone(),
                    actual: d.as_str().to_string(),
                }
                .into()),
                // the key column's foreign key makes this unreachable on a
                // consistent database
                None => Err(MapError::DanglingReference {
                    entity_id: id.to_string(),
                    target_id: owner.to_string(),
                    table: table.name().to_string(),
                }
                .into()),
            },
        }
    }

    fn secondary(&self, discriminator: Discriminator) -> Result<&'c SecondaryTable> {
        let layout = self.layout;
        layout.secondary_for(discriminator.as_str()).ok_or_else(|| {
            MapError::MissingVariant {
                discriminator: discriminator.as_str().to_string(),
            }
            .into()
        })
    }
}

fn load_pending<'c>(h: &Hydrator<'c>, id: Uuid) -> Result<Staged<'c>> {
    let mut pending = PendingEntity::with_id(id);
    let mut links = Vec::new();

    let layout = h.layout;
    let inverse_tables = layout
        .one_to_one_inverse_of(Discriminator::Pending.as_str())
        .into_iter()
        .filter(|t| t.owner == Discriminator::Posted.as_str());

    for table in inverse_tables {
        if let Some(owner) = SqliteRepo::find_inverse(h.conn, table, id)? {
            pending.fulfilled_by = Some(owner);
            links.push(Link::Inverse { table, owner });
        }
    }

    Ok(Staged {
        entity: pending.into(),
        links,
    })
}

fn load_posted<'c>(h: &Hydrator<'c>, id: Uuid) -> Result<Staged<'c>> {
    let table = h.secondary(Discriminator::Posted)?;
    let mut posted = PostedEntity::with_id(id);
    let mut links = Vec::new();

    if let Some(target) = SqliteRepo::find_reference(h.conn, table, id)? {
        posted.fulfilled_entity = Some(target);
        links.push(Link::Reference { table, target });
    }

    Ok(Staged {
        entity: posted.into(),
        links,
    })
}

fn load_exclusion<'c>(h: &Hydrator<'c>, id: Uuid) -> Result<Staged<'c>> {
    let table = h.secondary(Discriminator::Exclusion)?;
    let target = SqliteRepo::find_reference(h.conn, table, id)?;

    let links = target
        .map(|target| Link::Reference { table, target })
        .into_iter()
        .collect();

    Ok(Staged {
        entity: ExclusionEntity::new(id, target).into(),
        links,
    })
}
