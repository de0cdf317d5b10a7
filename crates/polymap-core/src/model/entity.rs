use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::discriminator::Discriminator;

/// Variant A: an entity waiting to be fulfilled
///
/// `fulfilled_by` is the inverse side of the one-to-one owned by
/// [`PostedEntity::fulfilled_entity`]. It is never written; the loader fills
/// it by reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntity {
    id: Uuid,
    pub fulfilled_by: Option<Uuid>,
}

impl PendingEntity {
    /// Create a pending entity with a fresh random id
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            fulfilled_by: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for PendingEntity {
    fn default() -> Self {
        Self::new()
    }
}

/// Variant B: owns an optional one-to-one link to a [`PendingEntity`]
///
/// The foreign key lives in this variant's secondary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedEntity {
    id: Uuid,
    pub fulfilled_entity: Option<Uuid>,
}

impl PostedEntity {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            fulfilled_entity: None,
        }
    }

    /// Builder form: fulfil the given pending entity
    pub fn fulfilling(mut self, pending_id: Uuid) -> Self {
        self.fulfilled_entity = Some(pending_id);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for PostedEntity {
    fn default() -> Self {
        Self::new()
    }
}

/// Variant C: owns a many-to-one link to any concrete entity
///
/// The target's concrete type is only known from the target row's own
/// discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionEntity {
    id: Uuid,
    pub compensating_entity: Option<Uuid>,
}

impl ExclusionEntity {
    pub fn new(id: Uuid, compensating_entity: Option<Uuid>) -> Self {
        Self {
            id,
            compensating_entity,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// Closed sum over every concrete variant sharing the entity table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entity {
    Pending(PendingEntity),
    Posted(PostedEntity),
    Exclusion(ExclusionEntity),
}

impl Entity {
    pub fn id(&self) -> Uuid {
        match self {
            Entity::Pending(e) => e.id(),
            Entity::Posted(e) => e.id(),
            Entity::Exclusion(e) => e.id(),
        }
    }

    pub fn discriminator(&self) -> Discriminator {
        match self {
            Entity::Pending(_) => Discriminator::Pending,
            Entity::Posted(_) => Discriminator::Posted,
            Entity::Exclusion(_) => Discriminator::Exclusion,
        }
    }

    /// The foreign key this entity owns, if set
    ///
    /// Inverse-side links (`PendingEntity::fulfilled_by`) are not owning and
    /// are never returned here.
    pub fn owning_reference(&self) -> Option<Uuid> {
        match self {
            Entity::Pending(_) => None,
            Entity::Posted(e) => e.fulfilled_entity,
            Entity::Exclusion(e) => e.compensating_entity,
        }
    }

    pub fn as_pending(&self) -> Option<&PendingEntity> {
        match self {
            Entity::Pending(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_posted(&self) -> Option<&PostedEntity> {
        match self {
            Entity::Posted(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_exclusion(&self) -> Option<&ExclusionEntity> {
        match self {
            Entity::Exclusion(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PendingEntity> for Entity {
    fn from(e: PendingEntity) -> Self {
        Entity::Pending(e)
    }
}

impl From<PostedEntity> for Entity {
    fn from(e: PostedEntity) -> Self {
        Entity::Posted(e)
    }
}

impl From<ExclusionEntity> for Entity {
    fn from(e: ExclusionEntity) -> Self {
        Entity::Exclusion(e)
    }
}
