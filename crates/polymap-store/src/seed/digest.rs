//! Fixture digest canonicalization
//!
//! Computes stable SHA256 digests of fixtures for reproducibility

use crate::errors::{serialization_error, Result};
use crate::seed::format_v0::FixtureV0;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Canonical representation of a fixture for digest calculation
#[derive(Debug, Clone, Serialize)]
struct CanonicalFixture {
    schema_version: u32,
    entities: Vec<CanonicalEntity>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord)]
struct CanonicalEntity {
    id: String,
    kind: &'static str,
    reference: Option<String>,
}

/// Compute a stable digest for a fixture
///
/// Entity order, UUID letter case and YAML formatting do not affect the
/// result.
pub fn compute_fixture_digest(fixture: &FixtureV0) -> Result<String> {
    let canonical = canonicalize_fixture(fixture);

    let json = serde_json::to_string(&canonical)
        .map_err(|e| serialization_error("fixture_digest", &e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn canonicalize_fixture(fixture: &FixtureV0) -> CanonicalFixture {
    let mut entities: Vec<CanonicalEntity> = fixture
        .entities
        .iter()
        .map(|e| CanonicalEntity {
            id: canonical_uuid(&e.id),
            kind: e.kind.as_str(),
            reference: e
                .fulfilled_entity
                .as_deref()
                .or(e.compensating_entity.as_deref())
                .map(canonical_uuid),
        })
        .collect();
    entities.sort();

    CanonicalFixture {
        schema_version: fixture.schema_version,
        entities,
    }
}

// Parsed fixtures always hold valid UUIDs; anything else is hashed as-is
fn canonical_uuid(value: &str) -> String {
    Uuid::parse_str(value)
        .map(|u| u.hyphenated().to_string())
        .unwrap_or_else(|_| value.to_string())
}
