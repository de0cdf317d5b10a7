//! Fixture import
//!
//! Provides:
//! - Fixture format v0 schema
//! - YAML parser with validation
//! - Digest canonicalization
//! - Importer orchestration

pub mod digest;
pub mod format_v0;
pub mod importer;
pub mod parser;

pub use digest::compute_fixture_digest;
pub use format_v0::{FixtureEntity, FixtureV0};
pub use importer::import_fixture;
pub use parser::{parse_fixture, parse_fixture_str};
