//! polymap store - SQLite persistence for the mapped hierarchy
//!
//! Provides:
//! - Connection setup with enforced foreign keys
//! - Schema migrations generated from the mapped layout, with checksums
//! - Row repository, graph persister and graph loader
//! - `Session`, one connection plus one layout
//! - YAML fixture import and the reference scenario

pub mod db;
pub mod errors;
pub mod fixture;
pub mod migrations;
pub mod repo;
pub mod seed;
pub mod session;

// Re-export key types
pub use errors::Result;
pub use repo::persist::PersistReport;
pub use session::Session;
