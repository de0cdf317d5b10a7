//! Migration framework
//!
//! The schema is not hand-written SQL: each table of the mapped layout
//! becomes one migration. Applied migrations are recorded with a checksum,
//! so a layout that drifts from an existing database is refused instead of
//! silently diverging.

mod checksums;
mod plan;
mod runner;

pub use checksums::compute_checksum;
pub use plan::{plan_migrations, Migration};
pub use runner::{applied_migrations, apply_migrations};
