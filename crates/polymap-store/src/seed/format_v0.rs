//! Fixture format v0 schema
//!
//! ```yaml
//! schema_version: 0
//! entities:
//!   - id: 1c22bdda-631a-4586-80c3-ed92861d3ee4
//!     type: pending
//!   - id: f243f815-e55a-4ede-bcd8-513a55991064
//!     type: posted
//!     fulfilled_entity: 1c22bdda-631a-4586-80c3-ed92861d3ee4
//! ```

use polymap_core::Discriminator;
use serde::{Deserialize, Serialize};

/// Top-level fixture file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureV0 {
    /// Schema version (must be 0 for this format)
    pub schema_version: u32,

    #[serde(default)]
    pub entities: Vec<FixtureEntity>,
}

/// One entity declaration
///
/// Ids and references stay strings here; the parser validates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureEntity {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: Discriminator,

    /// Only valid on `posted`
    #[serde(default)]
    pub fulfilled_entity: Option<String>,

    /// Only valid on `exclusion`
    #[serde(default)]
    pub compensating_entity: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_fixture() {
        let yaml = r#"
schema_version: 0
entities:
  - id: 1c22bdda-631a-4586-80c3-ed92861d3ee4
    type: pending
  - id: 61137189-40f8-478b-b2aa-5f63b91f3506
    type: exclusion
    compensating_entity: 1c22bdda-631a-4586-80c3-ed92861d3ee4
"#;

        let fixture: FixtureV0 = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fixture.schema_version, 0);
        assert_eq!(fixture.entities.len(), 2);
        assert_eq!(fixture.entities[0].kind, Discriminator::Pending);
        assert_eq!(fixture.entities[1].kind, Discriminator::Exclusion);
        assert!(fixture.entities[1].compensating_entity.is_some());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let yaml = r#"
schema_version: 0
entities:
  - id: 1c22bdda-631a-4586-80c3-ed92861d3ee4
    type: archived
"#;
        assert!(serde_yaml::from_str::<FixtureV0>(yaml).is_err());
    }
}
