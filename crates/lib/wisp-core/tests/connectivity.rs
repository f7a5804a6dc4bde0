use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use wisp_core::collection::{CollectionKind, NodeCollection, NodeIndex};
use wisp_core::error::SimError;
use wisp_core::hashbrown::{HashMap, HashSet};
use wisp_core::node::NodeId;
use wisp_core::position::Point3;
use wisp_core::simulation::Simulation;
use wisp_testutils::behavior::{Recorder, Seen};
use wisp_testutils::models::{static_models, Drift, LinkTable, WithinRadius};
use wisp_testutils::sim::{behavior_of, create_simulation, place, test_project};

fn edge_set(sim: &Simulation) -> HashSet<(NodeId, NodeId)> {
    sim.edges().map(|edge| (edge.source(), edge.target())).collect()
}

#[test]
fn test_edges_are_directed() {
    let links = LinkTable::default();
    links.connect(1, 2);
    let mut project = test_project("directed");
    project.nack_enabled = true;
    let mut sim = create_simulation(project, 1.0);
    place(&mut sim, 1, 10.0, 10.0, static_models(links.model()), Recorder::new());
    let back = Recorder::new().sending(1, 1, 7);
    place(&mut sim, 2, 20.0, 10.0, static_models(links.model()), back);

    sim.run_round().unwrap();
    assert!(sim.node(&NodeId::from(1)).unwrap().has_edge_to(&NodeId::from(2)));
    assert!(!sim.node(&NodeId::from(2)).unwrap().has_edge_to(&NodeId::from(1)));

    sim.run_round().unwrap();
    assert!(behavior_of::<Recorder>(&sim, 1).received().is_empty());
    assert_eq!(
        behavior_of::<Recorder>(&sim, 2).nacks(),
        vec![(2, NodeId::from(1), 7)]
    );
    assert_eq!(sim.statistics().sent_messages(), 1);
    assert_eq!(sim.statistics().received_messages(), 0);
}

#[test]
fn test_unicast_to_non_neighbor_is_dropped_without_nacks() {
    let links = LinkTable::default();
    let mut sim = create_simulation(test_project("no-nacks"), 1.0);
    place(&mut sim, 1, 10.0, 10.0, static_models(links.model()), Recorder::new());
    let lonely = Recorder::new().sending(1, 1, 3);
    place(&mut sim, 2, 20.0, 10.0, static_models(links.model()), lonely);

    sim.run_round().unwrap();
    sim.run_round().unwrap();
    assert_eq!(sim.statistics().sent_messages(), 1);
    assert_eq!(sim.statistics().dropped_messages(), 1);
    assert!(behavior_of::<Recorder>(&sim, 2).nacks().is_empty());
    assert!(sim.packets().is_empty());
}

#[test]
fn test_neighborhood_change_is_reported_once_per_change() {
    let links = LinkTable::default();
    links.connect(1, 2);
    let mut sim = create_simulation(test_project("neighborhood"), 1.0);
    place(&mut sim, 1, 10.0, 10.0, static_models(links.model()), Recorder::new());
    place(&mut sim, 2, 20.0, 10.0, static_models(links.model()), Recorder::new());

    sim.run_round().unwrap();
    sim.run_round().unwrap();
    assert_eq!(behavior_of::<Recorder>(&sim, 1).neighborhood_changes(), 1);
    assert_eq!(behavior_of::<Recorder>(&sim, 2).neighborhood_changes(), 0);

    links.disconnect(1, 2);
    sim.run_round().unwrap();
    let seen = &behavior_of::<Recorder>(&sim, 1).seen;
    assert!(seen.contains(&Seen::NeighborhoodChange(3)));
    assert_eq!(sim.edge_count(), 0);
}

#[test]
fn test_removed_edge_denies_its_packets() {
    let links = LinkTable::default();
    links.connect(1, 2);
    let mut sim = create_simulation(test_project("cut"), 3.0);
    let sender = Recorder::new().sending(1, 2, 1);
    place(&mut sim, 1, 10.0, 10.0, static_models(links.model()), sender);
    place(&mut sim, 2, 20.0, 10.0, static_models(links.model()), Recorder::new());

    sim.run_round().unwrap();
    links.disconnect(1, 2);
    sim.run_round().unwrap();
    links.connect(1, 2);
    sim.run_round().unwrap();
    let renewed = sim
        .node(&NodeId::from(1))
        .unwrap()
        .edge_to(&NodeId::from(2))
        .unwrap()
        .packet_count();
    assert_eq!(renewed, 0);

    sim.run_round().unwrap();
    assert!(behavior_of::<Recorder>(&sim, 2).received().is_empty());
    assert_eq!(sim.statistics().dropped_messages(), 1);
    assert_eq!(sim.edge_count(), 1);
}

#[test]
fn test_moving_nodes_lose_their_edges() {
    let mut project = test_project("drift");
    project.mobility_enabled = true;
    let mut sim = create_simulation(project, 1.0);
    let mut drifting = static_models(Box::new(WithinRadius(15.0)));
    drifting.mobility = Box::new(Drift(10.0));
    place(&mut sim, 1, 10.0, 10.0, drifting, Recorder::new());
    let steady = static_models(Box::new(WithinRadius(15.0)));
    place(&mut sim, 2, 20.0, 10.0, steady, Recorder::new());

    sim.initialize().unwrap();
    assert_eq!(sim.edge_count(), 2);
    sim.run_round().unwrap();
    assert_eq!(
        sim.node(&NodeId::from(1)).unwrap().position().point(),
        Ok(Point3::new(20.0, 10.0, 0.0))
    );
    assert_eq!(sim.edge_count(), 2);
    sim.run_round().unwrap();
    sim.run_round().unwrap();
    assert_eq!(sim.edge_count(), 0);
}

fn random_simulation(seed: u64, radius: f64, collection: Option<CollectionKind>) -> Simulation {
    let mut project = test_project("random");
    project.max_connection_radius = collection.map(|_| radius);
    project.collection = collection.unwrap_or_default();
    let mut sim = create_simulation(project, 1.0);
    let mut rng = Pcg64::seed_from_u64(seed);
    for id in 0..150 {
        let x = rng.gen_range(0.0..100.0);
        let y = rng.gen_range(0.0..100.0);
        let models = static_models(Box::new(WithinRadius(radius)));
        place(&mut sim, id, x, y, models, Recorder::new());
    }
    sim
}

fn brute_force(sim: &Simulation, radius: f64) -> HashSet<(NodeId, NodeId)> {
    let points: Vec<(NodeId, Point3)> = sim
        .nodes()
        .values()
        .map(|node| (node.id(), node.position().point().unwrap()))
        .collect();
    let mut edges = HashSet::new();
    for (a, pa) in points.iter() {
        for (b, pb) in points.iter() {
            if a != b && pa.distance(pb) <= radius {
                edges.insert((*a, *b));
            }
        }
    }
    edges
}

#[test]
fn test_spatial_index_matches_brute_force() {
    for seed in [3, 11, 42] {
        let expected = {
            let mut sim = random_simulation(seed, 12.0, None);
            sim.initialize().unwrap();
            let edges = edge_set(&sim);
            assert_eq!(edges, brute_force(&sim, 12.0));
            edges
        };
        for kind in [CollectionKind::Plane, CollectionKind::Spatial] {
            let mut sim = random_simulation(seed, 12.0, Some(kind));
            sim.initialize().unwrap();
            assert_eq!(edge_set(&sim), expected, "{:?} with seed {}", kind, seed);
        }
    }
}

#[test]
fn test_moving_nodes_stay_findable_in_both_indexes() {
    let radius = 12.0;
    for kind in [CollectionKind::Plane, CollectionKind::Spatial] {
        let mut rng = Pcg64::seed_from_u64(29);
        let mut index = NodeIndex::new(kind, radius);
        let mut points: HashMap<NodeId, Point3> = HashMap::new();
        for id in 0..120u64 {
            let point = Point3::new(
                rng.gen_range(0.0..100.0),
                rng.gen_range(0.0..100.0),
                rng.gen_range(0.0..10.0),
            );
            index.insert(NodeId::from(id), point);
            points.insert(NodeId::from(id), point);
        }

        for round in 0..20u64 {
            for id in 0..120u64 {
                let id = NodeId::from(id);
                let Some(point) = points.get(&id).copied() else {
                    continue;
                };
                let moved = Point3::new(
                    (point.x + rng.gen_range(-8.0..8.0)).clamp(0.0, 100.0),
                    (point.y + rng.gen_range(-8.0..8.0)).clamp(0.0, 100.0),
                    (point.z + rng.gen_range(-2.0..2.0)).clamp(0.0, 10.0),
                );
                index.reposition(id, moved);
                points.insert(id, moved);
            }
            let leaving = NodeId::from(rng.gen_range(0..120u64));
            if points.remove(&leaving).is_some() {
                assert!(index.remove(&leaving));
            }
            if round % 4 == 3 {
                let returning = NodeId::from(rng.gen_range(0..120u64));
                if !points.contains_key(&returning) {
                    let point = Point3::new(50.0, 50.0, 5.0);
                    index.insert(returning, point);
                    points.insert(returning, point);
                }
            }
            assert_eq!(index.len(), points.len());

            for (id, point) in points.iter() {
                let candidates: HashSet<NodeId> =
                    index.possible_neighbors(id).into_iter().collect();
                for (other, other_point) in points.iter() {
                    if other != id && point.distance(other_point) <= radius {
                        assert!(
                            candidates.contains(other),
                            "{:?} misses {} near {} in round {}",
                            kind,
                            other,
                            id,
                            round
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn test_remove_node_cleans_up_edges_and_packets() {
    let links = LinkTable::default();
    for (a, b) in [(1, 2), (2, 1), (1, 3), (3, 1), (2, 3), (3, 2)] {
        links.connect(a, b);
    }
    let mut sim = create_simulation(test_project("removal"), 3.0);
    let sender = Recorder::new().sending(1, 2, 1).sending(1, 3, 2);
    place(&mut sim, 1, 10.0, 10.0, static_models(links.model()), sender);
    place(&mut sim, 2, 20.0, 10.0, static_models(links.model()), Recorder::new());
    place(&mut sim, 3, 30.0, 10.0, static_models(links.model()), Recorder::new());

    sim.run_round().unwrap();
    assert_eq!(sim.edge_count(), 6);
    assert_eq!(sim.packets().len(), 2);

    sim.remove_node(NodeId::from(2)).unwrap();
    assert_eq!(sim.edge_count(), 2);
    assert_eq!(sim.packets().len(), 1);
    assert_eq!(sim.statistics().dropped_messages(), 1);
    assert!(matches!(
        sim.remove_node(NodeId::from(2)),
        Err(SimError::NodeNotFound(_))
    ));

    sim.remove_node(NodeId::from(1)).unwrap();
    for _ in 0..4 {
        sim.run_round().unwrap();
    }
    assert!(behavior_of::<Recorder>(&sim, 3).received().is_empty());
    assert_eq!(sim.statistics().dropped_messages(), 2);
    assert!(sim.packets().is_empty());
    assert_eq!(sim.edge_count(), 0);
}
