use std::collections::HashMap;

use uuid::Uuid;

use crate::errors::{MapError, Result};
use crate::model::{Entity, ExclusionEntity, PendingEntity, PostedEntity};

/// Insertion-ordered arena of entities keyed by identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityGraph {
    entities: Vec<Entity>,
    index: HashMap<Uuid, usize>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, returning its identifier
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntity` if the identifier is already present.
    pub fn insert(&mut self, entity: impl Into<Entity>) -> Result<Uuid> {
        let entity = entity.into();
        let id = entity.id();
        if self.index.contains_key(&id) {
            return Err(MapError::DuplicateEntity {
                entity_id: id.to_string(),
            });
        }
        self.index.insert(id, self.entities.len());
        self.entities.push(entity);
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Entity> {
        self.index.get(&id).and_then(|&i| self.entities.get(i))
    }

    pub(crate) fn get_mut(&mut self, id: Uuid) -> Option<&mut Entity> {
        match self.index.get(&id) {
            Some(&i) => self.entities.get_mut(i),
            None => None,
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    /// Position of an entity in insertion order
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.entities.iter().map(Entity::id).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Fill every `PendingEntity::fulfilled_by` from the owning posted side
    ///
    /// Builders only set the owning side; this mirrors what the loader
    /// reconstructs so in-memory and reloaded graphs compare equal.
    pub fn link_inverse_sides(&mut self) {
        let links: Vec<(Uuid, Uuid)> = self
            .entities
            .iter()
            .filter_map(|e| e.as_posted())
            .filter_map(|p| p.fulfilled_entity.map(|target| (target, p.id())))
            .collect();
        for (pending_id, posted_id) in links {
            if let Some(Entity::Pending(pending)) = self.get_mut(pending_id) {
                pending.fulfilled_by = Some(posted_id);
            }
        }
    }
}

/// Graph reconstructed by the loader, rooted at the requested identifier
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedGraph {
    root: Uuid,
    entities: EntityGraph,
}

impl LoadedGraph {
    /// Wrap an arena; the root must be one of its entities
    pub fn new(root: Uuid, entities: EntityGraph) -> Result<Self> {
        if !entities.contains(root) {
            return Err(MapError::EntityNotFound {
                entity_id: root.to_string(),
            });
        }
        Ok(Self { root, entities })
    }

    pub fn root_id(&self) -> Uuid {
        self.root
    }

    pub fn root(&self) -> &Entity {
        // Checked on construction
        &self.entities.entities[self.entities.index[&self.root]]
    }

    pub fn get(&self, id: Uuid) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Follow an optional reference
    pub fn resolve(&self, reference: Option<Uuid>) -> Option<&Entity> {
        reference.and_then(|id| self.get(id))
    }

    pub fn pending(&self, id: Uuid) -> Option<&PendingEntity> {
        self.get(id).and_then(Entity::as_pending)
    }

    pub fn posted(&self, id: Uuid) -> Option<&PostedEntity> {
        self.get(id).and_then(Entity::as_posted)
    }

    pub fn exclusion(&self, id: Uuid) -> Option<&ExclusionEntity> {
        self.get(id).and_then(Entity::as_exclusion)
    }

    pub fn entities(&self) -> &EntityGraph {
        &self.entities
    }

    pub fn into_entities(self) -> EntityGraph {
        self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicate_ids() {
        let mut graph = EntityGraph::new();
        let pending = PendingEntity::new();
        graph.insert(pending.clone()).unwrap();

        let err = graph.insert(pending).unwrap_err();
        assert!(matches!(err, MapError::DuplicateEntity { .. }));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_link_inverse_sides() {
        let mut graph = EntityGraph::new();
        let pending_id = graph.insert(PendingEntity::new()).unwrap();
        let posted_id = graph
            .insert(PostedEntity::new().fulfilling(pending_id))
            .unwrap();

        graph.link_inverse_sides();

        let pending = graph.get(pending_id).and_then(Entity::as_pending).unwrap();
        assert_eq!(pending.fulfilled_by, Some(posted_id));
    }

    #[test]
    fn test_loaded_graph_requires_root() {
        let graph = EntityGraph::new();
        assert!(LoadedGraph::new(Uuid::new_v4(), graph).is_err());
    }

    #[test]
    fn test_loaded_graph_resolve() {
        let mut graph = EntityGraph::new();
        let pending_id = graph.insert(PendingEntity::new()).unwrap();
        let exclusion_id = graph
            .insert(ExclusionEntity::new(Uuid::new_v4(), Some(pending_id)))
            .unwrap();

        let loaded = LoadedGraph::new(exclusion_id, graph).unwrap();
        let root = loaded.root().as_exclusion().unwrap();
        let target = loaded.resolve(root.compensating_entity).unwrap();
        assert_eq!(target.id(), pending_id);
        assert!(loaded.resolve(None).is_none());
    }
}
