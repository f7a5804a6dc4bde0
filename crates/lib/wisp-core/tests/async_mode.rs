use wisp_core::behavior::{NodeBehavior, NodeContext};
use wisp_core::error::{SimError, SimResult};
use wisp_core::event::{EventKind, EventQueue};
use wisp_core::inbox::Inbox;
use wisp_core::node::NodeId;
use wisp_core::packet::PacketId;
use wisp_core::simulation::Simulation;
use wisp_core::time::SimTime;
use wisp_testutils::behavior::{Ping, PingPong, Recorder, Seen};
use wisp_testutils::models::{static_models, LinkTable};
use wisp_testutils::sim::{behavior_of, create_simulation, place, test_project};

/// Sends one ping when it starts and records the times of the answers.
#[derive(Default)]
struct Starter {
    answers: Vec<(SimTime, u32)>,
}

impl NodeBehavior for Starter {
    fn init(&mut self, ctx: &mut NodeContext) -> SimResult<()> {
        ctx.send(NodeId::from(2), Ping(0));
        Ok(())
    }

    fn handle_messages(&mut self, ctx: &mut NodeContext, inbox: Inbox) -> SimResult<()> {
        for (_, ping) in inbox.messages_of::<Ping>() {
            self.answers.push((ctx.now(), ping.0));
        }
        Ok(())
    }
}

fn asynchronous_pair(delay: f64) -> Simulation {
    let links = LinkTable::default();
    links.connect(1, 2);
    links.connect(2, 1);
    let mut project = test_project("async");
    project.asynchronous = true;
    let mut sim = create_simulation(project, delay);
    place(&mut sim, 1, 10.0, 10.0, static_models(links.model()), Starter::default());
    place(&mut sim, 2, 20.0, 10.0, static_models(links.model()), PingPong::new(1, false));
    sim
}

#[test]
fn test_events_advance_time() {
    let mut sim = asynchronous_pair(0.5);
    assert_eq!(sim.run_events(2).unwrap(), 2);
    assert_eq!(sim.now(), SimTime::from(1.0));
    assert_eq!(behavior_of::<PingPong>(&sim, 2).arrivals, vec![(1, 0)]);
    assert_eq!(
        behavior_of::<Starter>(&sim, 1).answers,
        vec![(SimTime::from(1.0), 1)]
    );
    assert_eq!(sim.statistics().sent_messages(), 2);
    assert_eq!(sim.statistics().received_messages(), 2);
    assert!(sim.packets().is_empty());
    assert!(sim.events().is_empty());
}

#[test]
fn test_rounds_and_events_do_not_mix() {
    let mut sim = asynchronous_pair(0.5);
    assert!(matches!(sim.run_round(), Err(SimError::Config { .. })));

    let mut sync = create_simulation(test_project("sync"), 1.0);
    assert!(matches!(sync.run_events(1), Err(SimError::Config { .. })));
}

#[test]
fn test_run_until_fires_timers_and_moves_the_clock() {
    let mut project = test_project("timers");
    project.asynchronous = true;
    let mut sim = create_simulation(project, 1.0);
    let node = Recorder::new().with_timer(2.5, "ring");
    place(&mut sim, 1, 10.0, 10.0, static_models(LinkTable::default().model()), node);

    assert_eq!(sim.run_until(SimTime::from(2.0)).unwrap(), 0);
    assert_eq!(sim.now(), SimTime::from(2.0));
    assert_eq!(sim.run_until(SimTime::from(3.0)).unwrap(), 1);
    assert_eq!(sim.now(), SimTime::from(3.0));
    assert!(behavior_of::<Recorder>(&sim, 1)
        .seen
        .contains(&Seen::Timer(3, "ring".to_string())));
}

#[test]
fn test_advance_steps_one_time_unit() {
    let mut sim = asynchronous_pair(0.5);
    sim.advance().unwrap();
    assert_eq!(sim.now(), SimTime::from(1.0));
    assert_eq!(sim.statistics().received_messages(), 2);
}

#[test]
fn test_removed_node_loses_its_events() {
    let mut sim = asynchronous_pair(0.5);
    sim.initialize().unwrap();
    assert_eq!(sim.events().len(), 1);
    sim.remove_node(NodeId::from(2)).unwrap();
    assert!(sim.events().is_empty());
    assert_eq!(sim.run_events(5).unwrap(), 0);
}

fn packet_event(packet: u64) -> EventKind {
    EventKind::Packet {
        packet: PacketId::from(packet),
        origin: NodeId::from(1),
        destination: NodeId::from(2),
    }
}

#[test]
fn test_event_queue_orders_by_time_then_insertion() {
    let mut queue = EventQueue::default();
    queue.enqueue(SimTime::from(3.0), packet_event(0));
    queue.enqueue(SimTime::from(1.0), packet_event(1));
    queue.enqueue(SimTime::from(2.0), packet_event(2));
    queue.enqueue(SimTime::from(1.0), packet_event(3));

    assert_eq!(queue.peek().and_then(|event| event.packet()), Some(PacketId::from(1)));
    let order: Vec<PacketId> = std::iter::from_fn(|| queue.dequeue())
        .filter_map(|event| event.packet())
        .collect();
    let expected: Vec<PacketId> = [1u64, 3, 2, 0].into_iter().map(PacketId::from).collect();
    assert_eq!(order, expected);
    assert!(queue.is_empty());
}
