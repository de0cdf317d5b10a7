// Property: any valid graph reloads with the same ids, variants and
// targets, whatever order its entities were added in

use polymap_core::{Entity, EntityGraph, ExclusionEntity, PendingEntity, PostedEntity};
use polymap_store::Session;
use proptest::prelude::*;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Shape {
    Pending,
    // picks among earlier unfulfilled pending entities
    Posted(Option<usize>),
    // picks among all earlier entities
    Exclusion(Option<usize>),
}

fn shape_strategy() -> impl Strategy<Value = Vec<Shape>> {
    prop::collection::vec(
        prop_oneof![
            Just(Shape::Pending),
            any::<Option<usize>>().prop_map(Shape::Posted),
            any::<Option<usize>>().prop_map(Shape::Exclusion),
        ],
        1..12,
    )
}

/// Build a graph from the shapes; references only point backwards, so the
/// graph is acyclic. Each pending entity is fulfilled at most once.
fn build_graph(shapes: &[Shape]) -> Vec<Entity> {
    let mut entities: Vec<Entity> = Vec::new();
    let mut fulfilled = std::collections::HashSet::new();

    for shape in shapes {
        let entity: Entity = match shape {
            Shape::Pending => PendingEntity::new().into(),
            Shape::Posted(pick) => {
                let open: Vec<Uuid> = entities
                    .iter()
                    .filter_map(Entity::as_pending)
                    .map(|p| p.id())
                    .filter(|id| !fulfilled.contains(id))
                    .collect();
                let mut posted = PostedEntity::new();
                if let (Some(pick), false) = (pick, open.is_empty()) {
                    let target = open[pick % open.len()];
                    fulfilled.insert(target);
                    posted = posted.fulfilling(target);
                }
                posted.into()
            }
            Shape::Exclusion(pick) => {
                let target = match pick {
                    Some(pick) if !entities.is_empty() => {
                        Some(entities[pick % entities.len()].id())
                    }
                    _ => None,
                };
                ExclusionEntity::new(Uuid::new_v4(), target).into()
            }
        };
        entities.push(entity);
    }
    entities
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_round_trip(shapes in shape_strategy(), reverse in any::<bool>()) {
        let mut entities = build_graph(&shapes);
        if reverse {
            entities.reverse();
        }

        let mut graph = EntityGraph::new();
        for entity in entities {
            graph.insert(entity).unwrap();
        }

        let mut session = Session::open_in_memory().unwrap();
        session.persist(&graph).unwrap();

        graph.link_inverse_sides();
        for entity in graph.iter() {
            let loaded = session.find(entity.id()).unwrap().unwrap();
            prop_assert_eq!(loaded.root(), entity);
            // Every owning reference resolves inside the loaded graph
            if let Some(target) = entity.owning_reference() {
                prop_assert_eq!(
                    loaded.get(target).map(Entity::discriminator),
                    graph.get(target).map(Entity::discriminator)
                );
            }
        }

        let all = session.find_all().unwrap();
        prop_assert_eq!(all.len(), graph.len());
    }
}
