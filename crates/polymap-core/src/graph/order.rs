use std::collections::{BTreeSet, HashMap, HashSet};

use uuid::Uuid;

use super::arena::EntityGraph;
use crate::errors::{MapError, Result};

/// Order in which entities must be inserted
///
/// Every entity whose owning reference targets another entity of the same
/// graph comes after that target. Targets outside the graph are assumed to
/// exist already. A self-reference needs no ordering: the primary row is
/// always written before the same entity's secondary row. Ties are broken
/// by insertion order, so the result is deterministic.
///
/// # Errors
///
/// Returns `CycleDetected` if owning references between distinct entities
/// form a cycle.
pub fn insertion_order(graph: &EntityGraph) -> Result<Vec<Uuid>> {
    let ids = graph.ids();
    let mut pending_deps = vec![0usize; ids.len()];
    let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();

    for (pos, entity) in graph.iter().enumerate() {
        let Some(target) = entity.owning_reference() else {
            continue;
        };
        if target == entity.id() {
            continue;
        }
        if let Some(target_pos) = graph.position(target) {
            pending_deps[pos] += 1;
            dependents.entry(target_pos).or_default().push(pos);
        }
    }

    let mut ready: BTreeSet<usize> = pending_deps
        .iter()
        .enumerate()
        .filter(|(_, deps)| **deps == 0)
        .map(|(pos, _)| pos)
        .collect();
    let mut order = Vec::with_capacity(ids.len());

    while let Some(pos) = ready.pop_first() {
        order.push(ids[pos]);
        for &dependent in dependents.get(&pos).map(Vec::as_slice).unwrap_or_default() {
            pending_deps[dependent] -= 1;
            if pending_deps[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < ids.len() {
        let stuck = pending_deps
            .iter()
            .position(|&deps| deps > 0)
            .map(|pos| ids[pos].to_string())
            .unwrap_or_default();
        return Err(MapError::CycleDetected { entity_id: stuck });
    }

    Ok(order)
}

/// Sub-graph of `root` and everything it transitively owns a reference to
///
/// Only entities present in `graph` are followed. The result keeps the
/// original insertion order.
///
/// # Errors
///
/// Returns `EntityNotFound` if `root` is not in the graph.
pub fn reachable_from(graph: &EntityGraph, root: Uuid) -> Result<EntityGraph> {
    if !graph.contains(root) {
        return Err(MapError::EntityNotFound {
            entity_id: root.to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut cursor = Some(root);
    while let Some(id) = cursor {
        if !seen.insert(id) {
            break;
        }
        cursor = graph
            .get(id)
            .and_then(|e| e.owning_reference())
            .filter(|target| graph.contains(*target));
    }

    let mut sub = EntityGraph::new();
    for entity in graph.iter().filter(|e| seen.contains(&e.id())) {
        sub.insert(entity.clone())?;
    }
    Ok(sub)
}
