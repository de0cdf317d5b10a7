// Integration tests: a base-typed reference materializes as the concrete
// variant named by the referenced row's own discriminator

use polymap_core::{Discriminator, EntityGraph, ExErrorKind, ExclusionEntity, PendingEntity, PostedEntity};
use polymap_store::Session;
use uuid::Uuid;

fn store(session: &mut Session, target: impl Into<polymap_core::Entity>) -> (Uuid, Uuid) {
    let mut graph = EntityGraph::new();
    let target_id = graph.insert(target).unwrap();
    let exclusion_id = graph
        .insert(ExclusionEntity::new(Uuid::new_v4(), Some(target_id)))
        .unwrap();
    session.persist(&graph).unwrap();
    (exclusion_id, target_id)
}

#[test]
fn test_reference_to_each_variant_resolves_concretely() {
    let mut session = Session::open_in_memory().unwrap();

    let targets: Vec<(polymap_core::Entity, Discriminator)> = vec![
        (PendingEntity::new().into(), Discriminator::Pending),
        (PostedEntity::new().into(), Discriminator::Posted),
        (ExclusionEntity::new(Uuid::new_v4(), None).into(), Discriminator::Exclusion),
    ];

    for (target, expected) in targets {
        // Given: An exclusion referencing a target of one variant
        let (exclusion_id, target_id) = store(&mut session, target);

        // When: The exclusion is loaded
        let loaded = session.find(exclusion_id).unwrap().unwrap();

        // Then: The target comes back as that variant
        let exclusion = loaded.exclusion(exclusion_id).unwrap();
        let resolved = loaded.resolve(exclusion.compensating_entity).unwrap();
        assert_eq!(resolved.id(), target_id);
        assert_eq!(resolved.discriminator(), expected);
    }
}

#[test]
fn test_exclusion_may_compensate_itself() {
    let mut session = Session::open_in_memory().unwrap();
    let id = Uuid::new_v4();
    let mut graph = EntityGraph::new();
    graph.insert(ExclusionEntity::new(id, Some(id))).unwrap();

    session.persist(&graph).unwrap();

    let loaded = session.find(id).unwrap().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.exclusion(id).unwrap().compensating_entity, Some(id));
}

#[test]
fn test_chain_loads_transitively() {
    // Given: exclusion c -> exclusion b -> posted a -> pending p
    let mut session = Session::open_in_memory().unwrap();
    let mut graph = EntityGraph::new();
    let p = graph.insert(PendingEntity::new()).unwrap();
    let a = graph.insert(PostedEntity::new().fulfilling(p)).unwrap();
    let b = graph.insert(ExclusionEntity::new(Uuid::new_v4(), Some(a))).unwrap();
    let c = graph.insert(ExclusionEntity::new(Uuid::new_v4(), Some(b))).unwrap();
    session.persist(&graph).unwrap();

    // When: c is loaded
    let loaded = session.find(c).unwrap().unwrap();

    // Then: The whole chain is present with concrete types
    assert_eq!(loaded.len(), 4);
    assert!(loaded.exclusion(b).is_some());
    assert!(loaded.posted(a).is_some());
    assert_eq!(loaded.pending(p).unwrap().fulfilled_by, Some(a));
}

#[test]
fn test_stored_row_with_unknown_discriminator_fails_load() {
    // Given: An exclusion whose target row was written with a foreign value
    let mut session = Session::open_in_memory().unwrap();
    let target = Uuid::new_v4();
    session
        .connection()
        .execute(
            "INSERT INTO ENTITY (ID, TYPE) VALUES (?1, 'REFUND')",
            [target.to_string()],
        )
        .unwrap();
    let mut graph = EntityGraph::new();
    let exclusion = graph
        .insert(ExclusionEntity::new(Uuid::new_v4(), Some(target)))
        .unwrap();
    session.persist(&graph).unwrap();

    // When: The exclusion is loaded
    let err = session.find(exclusion).unwrap_err();

    // Then: The unknown value is reported, not guessed
    assert_eq!(err.kind(), ExErrorKind::UnknownDiscriminator);
    assert_eq!(err.entity_id(), Some(target.to_string().as_str()));
}
