use std::sync::{Arc, Mutex};

use wisp_core::error::SimResult;
use wisp_core::hooks::{GlobalContext, GlobalHooks};
use wisp_core::message::TimerData;
use wisp_core::node::NodeId;
use wisp_core::simulation::Simulation;
use wisp_core::time::SimTime;
use wisp_testutils::behavior::{Ping, PingPong, Recorder, Seen};
use wisp_testutils::models::{static_models, FixedDelay, LinkTable};
use wisp_testutils::sim::{behavior_of, create_simulation, place, test_project};

fn linked_pair(delay: f64, first: Recorder, second: Recorder) -> Simulation {
    let links = LinkTable::default();
    links.connect(1, 2);
    links.connect(2, 1);
    let mut sim = create_simulation(test_project("pair"), delay);
    place(&mut sim, 1, 10.0, 10.0, static_models(links.model()), first);
    place(&mut sim, 2, 20.0, 10.0, static_models(links.model()), second);
    sim
}

#[test]
fn test_ping_pong_arrives_after_transmission_time() {
    let links = LinkTable::default();
    links.connect(1, 2);
    links.connect(2, 1);
    let mut sim = create_simulation(test_project("ping-pong"), 3.0);
    place(&mut sim, 1, 10.0, 10.0, static_models(links.model()), PingPong::new(2, true));
    place(&mut sim, 2, 20.0, 10.0, static_models(links.model()), PingPong::new(1, false));

    for _ in 0..7 {
        sim.run_round().unwrap();
    }
    assert_eq!(sim.now(), SimTime::from(7u64));
    assert_eq!(behavior_of::<PingPong>(&sim, 2).arrivals, vec![(4, 0)]);
    assert_eq!(behavior_of::<PingPong>(&sim, 1).arrivals, vec![(7, 1)]);
    assert_eq!(sim.statistics().sent_messages(), 3);
    assert_eq!(sim.statistics().received_messages(), 2);
}

#[test]
fn test_last_round_counters_reset_with_a_new_round() {
    let sender = Recorder::new()
        .sending(5, 2, 1)
        .sending(5, 2, 2)
        .sending(6, 2, 3);
    let mut sim = linked_pair(10.0, sender, Recorder::new());

    for _ in 0..5 {
        sim.run_round().unwrap();
    }
    assert_eq!(sim.statistics().last_round_sent_messages(), 2);
    sim.run_round().unwrap();
    assert_eq!(sim.statistics().last_round_sent_messages(), 1);
    assert_eq!(sim.statistics().sent_messages(), 3);
}

#[test]
fn test_step_runs_callbacks_in_order() {
    let receiver = Recorder::new().with_timer(1.5, "wake");
    let sender = Recorder::new().sending(1, 1, 42);
    let mut sim = linked_pair(1.0, receiver, sender);

    sim.run_round().unwrap();
    sim.run_round().unwrap();
    let seen = &behavior_of::<Recorder>(&sim, 1).seen;
    assert_eq!(
        seen,
        &vec![
            Seen::Init,
            Seen::PreStep(1),
            Seen::NeighborhoodChange(1),
            Seen::PostStep(1),
            Seen::PreStep(2),
            Seen::Timer(2, "wake".to_string()),
            Seen::Message {
                round: 2,
                from: NodeId::from(2),
                ping: 42
            },
            Seen::PostStep(2),
        ]
    );
}

#[test]
fn test_timers_fire_in_fire_time_order() {
    let node = Recorder::new().with_timer(2.5, "late").with_timer(2.2, "early");
    let mut sim = linked_pair(1.0, node, Recorder::new());

    sim.run_round().unwrap();
    sim.run_round().unwrap();
    assert_eq!(sim.node(&NodeId::from(1)).unwrap().pending_timers(), 2);
    sim.run_round().unwrap();
    let timers: Vec<&Seen> = behavior_of::<Recorder>(&sim, 1)
        .seen
        .iter()
        .filter(|seen| matches!(seen, Seen::Timer(..)))
        .collect();
    assert_eq!(
        timers,
        vec![
            &Seen::Timer(3, "early".to_string()),
            &Seen::Timer(3, "late".to_string())
        ]
    );
}

#[test]
fn test_broadcast_reaches_every_neighbor() {
    let links = LinkTable::default();
    links.connect(1, 2);
    links.connect(1, 3);
    let mut sim = create_simulation(test_project("broadcast"), 1.0);
    let models = || static_models(links.model());
    place(&mut sim, 1, 10.0, 10.0, models(), Recorder::new().broadcasting(1, 5));
    place(&mut sim, 2, 20.0, 10.0, models(), Recorder::new());
    place(&mut sim, 3, 30.0, 10.0, models(), Recorder::new());

    sim.run_round().unwrap();
    sim.run_round().unwrap();
    assert_eq!(sim.statistics().sent_messages(), 2);
    for id in [2, 3] {
        assert_eq!(
            behavior_of::<Recorder>(&sim, id).received(),
            vec![(2, NodeId::from(1), 5)]
        );
    }
}

#[test]
fn test_edge_counts_packets_in_flight() {
    let sender = Recorder::new().sending(1, 2, 1).sending(2, 2, 2);
    let mut sim = linked_pair(3.0, sender, Recorder::new());
    let in_flight = |sim: &Simulation| {
        sim.node(&NodeId::from(1))
            .unwrap()
            .edge_to(&NodeId::from(2))
            .map(|edge| edge.packet_count())
    };

    sim.run_round().unwrap();
    assert_eq!(in_flight(&sim), Some(1));
    sim.run_round().unwrap();
    sim.run_round().unwrap();
    assert_eq!(in_flight(&sim), Some(2));
    sim.run_round().unwrap();
    assert_eq!(in_flight(&sim), Some(1));
    sim.run_round().unwrap();
    assert_eq!(in_flight(&sim), Some(0));
    assert!(sim.packets().is_empty());
}

#[derive(Clone, Debug, PartialEq)]
enum HookCall {
    Pre(u64),
    Timer(u64),
    Post(u64),
}

struct Announcer {
    calls: Arc<Mutex<Vec<HookCall>>>,
}

impl Announcer {
    fn log(&self, call: HookCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl GlobalHooks for Announcer {
    fn initialize(&mut self, ctx: &mut GlobalContext) -> SimResult<()> {
        ctx.set_timer(1.5, "announce")
    }

    fn pre_round(&mut self, ctx: &mut GlobalContext) -> SimResult<()> {
        self.log(HookCall::Pre(ctx.now().as_round()));
        Ok(())
    }

    fn post_round(&mut self, ctx: &mut GlobalContext) -> SimResult<()> {
        self.log(HookCall::Post(ctx.now().as_round()));
        Ok(())
    }

    fn has_terminated(&self, ctx: &GlobalContext) -> bool {
        ctx.statistics().received_messages() > 0
    }

    fn on_global_timer(
        &mut self,
        ctx: &mut GlobalContext,
        _data: Box<dyn TimerData>,
    ) -> SimResult<()> {
        self.log(HookCall::Timer(ctx.now().as_round()));
        ctx.broadcast_from(NodeId::from(1), Ping(9))
    }
}

#[test]
fn test_global_hooks_run_around_the_nodes() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let hooks = Announcer {
        calls: calls.clone(),
    };
    let links = LinkTable::default();
    links.connect(1, 2);
    let mut sim = Simulation::new(
        test_project("hooks"),
        Box::new(FixedDelay(1.0)),
        Box::new(hooks),
    )
    .unwrap();
    place(&mut sim, 1, 10.0, 10.0, static_models(links.model()), Recorder::new());
    place(&mut sim, 2, 20.0, 10.0, static_models(links.model()), Recorder::new());

    sim.run_round().unwrap();
    sim.run_round().unwrap();
    assert!(!sim.has_terminated());
    sim.run_round().unwrap();
    assert!(sim.has_terminated());

    assert_eq!(
        behavior_of::<Recorder>(&sim, 2).received(),
        vec![(3, NodeId::from(1), 9)]
    );
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            HookCall::Pre(1),
            HookCall::Post(1),
            HookCall::Pre(2),
            HookCall::Timer(2),
            HookCall::Post(2),
            HookCall::Pre(3),
            HookCall::Post(3),
        ]
    );
}

#[test]
fn test_round_statistics_are_kept_on_request() {
    let mut project = test_project("history");
    project.keep_round_statistics = true;
    let links = LinkTable::default();
    links.connect(1, 2);
    let mut sim = create_simulation(project, 1.0);
    let sender = Recorder::new().sending(1, 2, 1).sending(3, 2, 2);
    place(&mut sim, 1, 10.0, 10.0, static_models(links.model()), sender);
    place(&mut sim, 2, 20.0, 10.0, static_models(links.model()), Recorder::new());

    for _ in 0..4 {
        sim.run_round().unwrap();
    }
    let first = sim.statistics().round(1).unwrap();
    assert_eq!(first.sent.messages, 1);
    assert_eq!(first.sent.bytes, 4);
    assert_eq!(sim.statistics().round(2).unwrap().received.messages, 1);
    assert!(sim.statistics().round(3).is_some());
    assert_eq!(sim.statistics().rounds().count(), 4);
}
