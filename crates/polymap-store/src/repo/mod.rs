//! Repository layer
//!
//! Row-level SQL in `sqlite_repo`, whole-graph writes in `persist` and
//! whole-graph reads in `hydration`.

pub mod hydration;
pub mod persist;
pub mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;
