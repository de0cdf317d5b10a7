//! Fixture parser with validation
//!
//! Parses YAML and validates schema version, id uniqueness and which
//! reference fields each entity type may carry

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, seed_validation, Result};
use crate::seed::format_v0::{FixtureEntity, FixtureV0};
use polymap_core::{Discriminator, Entity, EntityGraph, ExclusionEntity, PendingEntity, PostedEntity};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Parse a fixture file from a path
pub fn parse_fixture(path: &Path) -> Result<FixtureV0> {
    let content = fs::read_to_string(path).map_err(|e| io_error("fixture_read", e))?;
    parse_fixture_str(&content)
}

/// Parse a fixture from a string
pub fn parse_fixture_str(content: &str) -> Result<FixtureV0> {
    let fixture: FixtureV0 = serde_yaml::from_str(content)
        .map_err(|e| seed_validation(format!("YAML parse error: {}", e)))?;

    validate_fixture(&fixture)?;

    Ok(fixture)
}

/// Build the entity graph a validated fixture declares, in file order
pub fn fixture_graph(fixture: &FixtureV0) -> Result<EntityGraph> {
    let mut graph = EntityGraph::new();
    for entry in &fixture.entities {
        graph.insert(to_entity(entry)?)?;
    }
    Ok(graph)
}

fn validate_fixture(fixture: &FixtureV0) -> Result<()> {
    if fixture.schema_version != 0 {
        return Err(seed_validation(format!(
            "Unsupported schema_version: {}. Expected 0",
            fixture.schema_version
        )));
    }

    let mut seen = HashSet::new();
    for entry in &fixture.entities {
        let id = parse_id("id", &entry.id)?;
        if !seen.insert(id) {
            return Err(seed_validation(format!("Duplicate entity id {}", id)));
        }
        // Checks reference fields against the type
        to_entity(entry)?;
    }

    Ok(())
}

fn to_entity(entry: &FixtureEntity) -> Result<Entity> {
    let id = parse_id("id", &entry.id)?;
    let fulfilled = parse_ref("fulfilled_entity", entry.fulfilled_entity.as_deref())?;
    let compensating = parse_ref("compensating_entity", entry.compensating_entity.as_deref())?;

    let entity = match entry.kind {
        Discriminator::Pending => {
            reject_field(entry, "fulfilled_entity", fulfilled)?;
            reject_field(entry, "compensating_entity", compensating)?;
            PendingEntity::with_id(id).into()
        }
        Discriminator::Posted => {
            reject_field(entry, "compensating_entity", compensating)?;
            let mut posted = PostedEntity::with_id(id);
            posted.fulfilled_entity = fulfilled;
            posted.into()
        }
        Discriminator::Exclusion => {
            reject_field(entry, "fulfilled_entity", fulfilled)?;
            ExclusionEntity::new(id, compensating).into()
        }
    };
    Ok(entity)
}

fn reject_field(entry: &FixtureEntity, field: &str, value: Option<Uuid>) -> Result<()> {
    if value.is_some() {
        return Err(seed_validation(format!(
            "Entity {} of type {} cannot set {}",
            entry.id,
            entry.kind.type_name(),
            field
        )));
    }
    Ok(())
}

fn parse_id(field: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| seed_validation(format!("Field {} is not a UUID ({}): {}", field, value, e)))
}

fn parse_ref(field: &str, value: Option<&str>) -> Result<Option<Uuid>> {
    value.map(|v| parse_id(field, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polymap_core::ExErrorKind;

    #[test]
    fn test_parse_valid_fixture() {
        let yaml = r#"
schema_version: 0
entities:
  - id: 1c22bdda-631a-4586-80c3-ed92861d3ee4
    type: pending
  - id: f243f815-e55a-4ede-bcd8-513a55991064
    type: posted
    fulfilled_entity: 1c22bdda-631a-4586-80c3-ed92861d3ee4
"#;

        let fixture = parse_fixture_str(yaml).unwrap();
        let graph = fixture_graph(&fixture).unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_reject_invalid_schema_version() {
        let yaml = r#"
schema_version: 99
entities: []
"#;

        let err = parse_fixture_str(yaml).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert!(err.to_string().contains("schema_version"));
    }

    #[test]
    fn test_reject_duplicate_ids() {
        let yaml = r#"
schema_version: 0
entities:
  - id: 1c22bdda-631a-4586-80c3-ed92861d3ee4
    type: pending
  - id: 1C22BDDA-631A-4586-80C3-ED92861D3EE4
    type: posted
"#;

        let err = parse_fixture_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate entity id"));
    }

    #[test]
    fn test_reject_reference_on_wrong_type() {
        let yaml = r#"
schema_version: 0
entities:
  - id: 1c22bdda-631a-4586-80c3-ed92861d3ee4
    type: pending
    compensating_entity: f243f815-e55a-4ede-bcd8-513a55991064
"#;

        let err = parse_fixture_str(yaml).unwrap_err();
        assert!(err.to_string().contains("cannot set compensating_entity"));
    }

    #[test]
    fn test_reject_non_uuid_reference() {
        let yaml = r#"
schema_version: 0
entities:
  - id: 61137189-40f8-478b-b2aa-5f63b91f3506
    type: exclusion
    compensating_entity: pending-1
"#;

        let err = parse_fixture_str(yaml).unwrap_err();
        assert!(err.to_string().contains("compensating_entity"));
    }
}
