//! polymap core - mapping, model and ordering for a discriminated hierarchy
//!
//! This crate holds everything that does not touch a database:
//! - The closed entity model (`Discriminator`, `Entity` and its variants)
//! - The schema mapper producing a physical `TableLayout`
//! - Entity graphs and the dependency-respecting insertion order
//! - The error facility and structured logging macros

pub mod errors;
pub mod graph;
pub mod logging_facility;
pub mod mapping;
pub mod model;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, MapError, Result};
pub use graph::{insertion_order, reachable_from, EntityGraph, LoadedGraph};
pub use mapping::{map_hierarchy, standard_hierarchy, standard_layout, TableLayout};
pub use model::{Discriminator, Entity, ExclusionEntity, PendingEntity, PostedEntity};
