//! Reference scenario: one pending, one posted fulfilling it, one exclusion
//! compensating it through a base-typed reference
//!
//! Loading the exclusion must yield its target as a pending entity (not a
//! proxy of the base type) whose inverse link points back at the posted
//! entity.

#![allow(clippy::result_large_err)]

use crate::errors::Result;
use crate::session::Session;
use polymap_core::errors::MapError;
use polymap_core::{
    Discriminator, EntityGraph, ExclusionEntity, LoadedGraph, PendingEntity, PostedEntity,
};
use uuid::{uuid, Uuid};

pub const PENDING_ID: Uuid = uuid!("1c22bdda-631a-4586-80c3-ed92861d3ee4");
pub const POSTED_ID: Uuid = uuid!("f243f815-e55a-4ede-bcd8-513a55991064");
pub const EXCLUSION_ID: Uuid = uuid!("61137189-40f8-478b-b2aa-5f63b91f3506");

/// The three scenario entities, targets first
pub fn scenario_graph() -> polymap_core::Result<EntityGraph> {
    let mut graph = EntityGraph::new();
    graph.insert(PendingEntity::with_id(PENDING_ID))?;
    graph.insert(PostedEntity::with_id(POSTED_ID).fulfilling(PENDING_ID))?;
    graph.insert(ExclusionEntity::new(EXCLUSION_ID, Some(PENDING_ID)))?;
    Ok(graph)
}

/// Check a graph loaded from [`EXCLUSION_ID`]
///
/// # Errors
///
/// `ScenarioMismatch` naming the first expectation that does not hold.
pub fn verify(loaded: &LoadedGraph) -> polymap_core::Result<()> {
    let mismatch = |reason: String| MapError::ScenarioMismatch { reason };

    let exclusion = loaded
        .root()
        .as_exclusion()
        .ok_or_else(|| mismatch(format!("root is {}", loaded.root().discriminator())))?;
    if exclusion.id() != EXCLUSION_ID {
        return Err(mismatch(format!("root id is {}", exclusion.id())));
    }

    let target = loaded
        .resolve(exclusion.compensating_entity)
        .ok_or_else(|| mismatch("compensating entity is null".to_string()))?;
    let pending = target.as_pending().ok_or_else(|| {
        mismatch(format!(
            "compensating entity {} loaded as {}, expected {}",
            target.id(),
            target.discriminator().type_name(),
            Discriminator::Pending.type_name()
        ))
    })?;
    if pending.id() != PENDING_ID {
        return Err(mismatch(format!("compensating entity id is {}", pending.id())));
    }

    let fulfiller = loaded
        .resolve(pending.fulfilled_by)
        .ok_or_else(|| mismatch("pending entity has no fulfiller".to_string()))?;
    if fulfiller.id() != POSTED_ID {
        return Err(mismatch(format!("pending entity is fulfilled by {}", fulfiller.id())));
    }

    Ok(())
}

/// Persist the scenario (unless already stored), reload it and verify
///
/// Re-running against a database that already holds all three entities
/// only reloads and verifies.
pub fn run_scenario(session: &mut Session) -> Result<LoadedGraph> {
    let stored = [PENDING_ID, POSTED_ID, EXCLUSION_ID]
        .into_iter()
        .map(|id| session.exists(id))
        .collect::<Result<Vec<bool>>>()?;

    if stored.iter().all(|s| *s) {
        tracing::info!(entity_id = %EXCLUSION_ID, "Scenario already stored, verifying only");
    } else {
        session.persist(&scenario_graph()?)?;
    }

    let loaded = session
        .find(EXCLUSION_ID)?
        .ok_or_else(|| MapError::ScenarioMismatch {
            reason: format!("entity {} was not found after commit", EXCLUSION_ID),
        })?;
    verify(&loaded)?;

    Ok(loaded)
}
