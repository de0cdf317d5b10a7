pub mod discriminator;
pub mod entity;

pub use discriminator::Discriminator;
pub use entity::{Entity, ExclusionEntity, PendingEntity, PostedEntity};
