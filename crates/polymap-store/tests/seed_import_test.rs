// Integration tests for fixture import

use polymap_core::{Discriminator, ExErrorKind};
use polymap_store::fixture::{self, EXCLUSION_ID, PENDING_ID, POSTED_ID};
use polymap_store::seed::{import_fixture, parse_fixture};
use polymap_store::Session;
use std::path::PathBuf;
use uuid::Uuid;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_import_scenario_fixture() {
    // Given: A fresh session and the scenario fixture
    let mut session = Session::open_in_memory().unwrap();

    // When: The fixture is imported
    let digest = import_fixture(&fixtures_dir().join("scenario.yaml"), &mut session).unwrap();

    // Then: A digest is returned and the scenario verifies
    assert_eq!(digest.len(), 64);
    let loaded = session.find(EXCLUSION_ID).unwrap().unwrap();
    fixture::verify(&loaded).unwrap();
}

#[test]
fn test_file_order_does_not_matter() {
    // Given: The scenario with referrers listed before their targets
    let mut session = Session::open_in_memory().unwrap();

    // When: It is imported
    let digest = import_fixture(
        &fixtures_dir().join("scenario_reordered.yaml"),
        &mut session,
    )
    .unwrap();

    // Then: Insertion order is derived, and the digest matches the ordered file
    let mut other = Session::open_in_memory().unwrap();
    let ordered = import_fixture(&fixtures_dir().join("scenario.yaml"), &mut other).unwrap();
    assert_eq!(digest, ordered);
    assert_eq!(session.count_rows("ENTITY").unwrap(), 3);
    assert_eq!(
        session.find(PENDING_ID).unwrap().unwrap().pending(PENDING_ID).unwrap().fulfilled_by,
        Some(POSTED_ID)
    );
}

#[test]
fn test_follow_up_fixture_references_stored_entity() {
    // Given: The scenario already imported
    let mut session = Session::open_in_memory().unwrap();
    import_fixture(&fixtures_dir().join("scenario.yaml"), &mut session).unwrap();

    // When: A second fixture references an entity from the first
    import_fixture(&fixtures_dir().join("follow_up.yaml"), &mut session).unwrap();

    // Then: The new exclusion resolves to the stored posted entity
    let id = Uuid::parse_str("0b7e3a52-9d1c-4f0e-8a61-3c2f5b7d9e14").unwrap();
    let loaded = session.find(id).unwrap().unwrap();
    let target = loaded
        .resolve(loaded.exclusion(id).unwrap().compensating_entity)
        .unwrap();
    assert_eq!(target.discriminator(), Discriminator::Posted);
}

#[test]
fn test_follow_up_alone_fails_atomically() {
    // Given: An empty database
    let mut session = Session::open_in_memory().unwrap();

    // When: A fixture references an entity that is not stored
    let err = import_fixture(&fixtures_dir().join("follow_up.yaml"), &mut session).unwrap_err();

    // Then: Nothing is written
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    assert_eq!(session.count_rows("ENTITY").unwrap(), 0);
}

#[test]
fn test_invalid_fixture_is_rejected_before_persisting() {
    let mut session = Session::open_in_memory().unwrap();
    let path = fixtures_dir().join("invalid_reference.yaml");

    assert!(parse_fixture(&path).is_err());
    let err = import_fixture(&path, &mut session).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert!(err.to_string().contains("fulfilled_entity"));
    assert_eq!(session.count_rows("ENTITY").unwrap(), 0);
}

#[test]
fn test_missing_file_is_io_error() {
    let mut session = Session::open_in_memory().unwrap();
    let err = import_fixture(&fixtures_dir().join("nope.yaml"), &mut session).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Io);
}
