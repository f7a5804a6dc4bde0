use wisp_core::node::NodeId;
use wisp_core::simulation::Simulation;
use wisp_testutils::behavior::Recorder;
use wisp_testutils::models::{static_models, Crowded, LinkTable, Unreliable};
use wisp_testutils::sim::{behavior_of, create_simulation, place, test_project};

/// Nodes 1 and 3 both send to node 2 in the first round.
fn crowded_receiver(limit: usize, additive: bool, delay: f64) -> Simulation {
    let links = LinkTable::default();
    links.connect(1, 2);
    links.connect(3, 2);
    let mut project = test_project("crowded");
    project.interference_enabled = true;
    project.additive_interference = additive;
    let mut sim = create_simulation(project, delay);

    let first = Recorder::new().sending(1, 2, 1);
    place(&mut sim, 1, 10.0, 10.0, static_models(links.model()), first);
    let mut receiver = static_models(links.model());
    receiver.interference = Box::new(Crowded { limit });
    place(&mut sim, 2, 20.0, 10.0, receiver, Recorder::new());
    let second = Recorder::new().sending(1, 2, 3);
    place(&mut sim, 3, 30.0, 10.0, static_models(links.model()), second);
    sim
}

#[test]
fn test_interference_denial_is_permanent() {
    for additive in [true, false] {
        let mut sim = crowded_receiver(1, additive, 2.0);
        sim.run_round().unwrap();
        assert_eq!(sim.air().len(), 2);
        for _ in 0..3 {
            sim.run_round().unwrap();
        }
        assert!(behavior_of::<Recorder>(&sim, 2).received().is_empty());
        assert_eq!(sim.statistics().dropped_messages(), 2);
        assert!(sim.air().is_empty());
    }
}

#[test]
fn test_packets_below_the_limit_are_delivered() {
    for additive in [true, false] {
        let mut sim = crowded_receiver(2, additive, 1.0);
        sim.run_round().unwrap();
        sim.run_round().unwrap();
        assert_eq!(behavior_of::<Recorder>(&sim, 2).received().len(), 2);
        assert_eq!(sim.statistics().dropped_messages(), 0);
    }
}

#[test]
fn test_unreliable_sender_never_delivers() {
    let links = LinkTable::default();
    links.connect(1, 2);
    let mut project = test_project("lossy");
    project.nack_enabled = true;
    let mut sim = create_simulation(project, 1.0);
    let mut lossy = static_models(links.model());
    lossy.reliability = Box::new(Unreliable);
    place(&mut sim, 1, 10.0, 10.0, lossy, Recorder::new().sending(1, 2, 8));
    place(&mut sim, 2, 20.0, 10.0, static_models(links.model()), Recorder::new());

    for _ in 0..3 {
        sim.run_round().unwrap();
    }
    assert!(behavior_of::<Recorder>(&sim, 2).received().is_empty());
    let nacks = behavior_of::<Recorder>(&sim, 1).nacks();
    assert_eq!(nacks, vec![(3, NodeId::from(2), 8)]);
    assert_eq!(sim.statistics().sent_messages(), 1);
    assert_eq!(sim.statistics().received_messages(), 0);
}
