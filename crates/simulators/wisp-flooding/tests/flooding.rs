use wisp_core::control::RunState;
use wisp_core::error::SimError;
use wisp_core::node::NodeId;
use wisp_flooding::flooding::hooks::coverage;
use wisp_flooding::flooding::relay::{Reception, Relay};
use wisp_flooding::simulation::builder::SimulationBuilder;
use wisp_flooding::simulation::config::parse_config;
use wisp_testutils::sim::behavior_of;

const GRID: &str = r#"
[project]
name = "grid-flood"
dimensions = { dim_x = [0.0, 100.0], dim_y = [0.0, 100.0] }
message_transmission = { model = "constanttime", params = { time = 1.0 } }

[run_settings]
rounds = 50
headless = true

[flooding]
nodes = 9
source = 0
interval = 5
floods = 2
payload_size = 10
distribution = { model = "grid2d" }

[flooding.node_models]
mobility = { model = "nomobility" }
connectivity = { model = "udg", params = { radius = 34.0 } }
interference = { model = "nointerference" }
reliability = { model = "reliabledelivery" }

[log_settings]
log_path = "run"
log_level = "debug"
log_file_name = "flooding.log"
log_overwrite = true
"#;

fn builder(config: &str) -> SimulationBuilder {
    let config = parse_config(config).unwrap();
    SimulationBuilder::with_config(config, std::env::temp_dir(), "inline")
}

#[test]
fn test_sample_configuration_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/flooding.toml");
    let content = std::fs::read_to_string(path).unwrap();
    let config = parse_config(&content).unwrap();
    assert_eq!(config.flooding.nodes, 200);
    assert_eq!(config.flooding.node_models.connectivity.model, "udg");
    assert_eq!(config.output_settings.map(|o| o.outputs.len()), Some(2));
}

#[test]
fn test_floods_cover_the_grid_hop_by_hop() {
    let _ = env_logger::builder().is_test(true).try_init();
    let builder = builder(GRID);
    let mut sim = builder.build_simulation().unwrap();
    let mut driver = builder.driver();

    let state = driver
        .run(&mut sim, builder.rounds(), |_| {}, |_| {})
        .unwrap();
    assert_eq!(state, RunState::Finished);
    assert_eq!(sim.now().as_round(), 10);
    assert_eq!(coverage(sim.nodes()), vec![9, 9]);

    let far_corner = behavior_of::<Relay>(&sim, 8);
    assert_eq!(far_corner.reception(0), Some(Reception { round: 5, hops: 4 }));
    assert_eq!(far_corner.reception(1), Some(Reception { round: 10, hops: 4 }));
    let source = behavior_of::<Relay>(&sim, 0);
    assert!(source.is_source());
    assert_eq!(source.issued(), 2);
    assert_eq!(sim.node(&NodeId::from(4)).unwrap().edge_count(), 4);
}

#[test]
fn test_every_node_relays_a_flood_once() {
    let builder = builder(GRID);
    let mut sim = builder.build_simulation().unwrap();
    for _ in 0..5 {
        sim.run_round().unwrap();
    }
    // One broadcast per node over 24 directed edges.
    assert_eq!(sim.statistics().sent_messages(), 24);
    assert_eq!(sim.statistics().sent_message_bytes(), 24 * 26);
}

#[test]
fn test_invalid_configurations_are_rejected() {
    let unknown = GRID.replace("floods = 2", "floods = 2\nflood_count = 3");
    assert!(parse_config(&unknown).is_err());

    let misplaced = GRID.replace("source = 0", "source = 9");
    let error = parse_config(&misplaced).unwrap_err();
    assert_eq!(
        error.downcast_ref::<SimError>(),
        Some(&SimError::config("flooding.source", "9 is not one of the 9 nodes"))
    );

    let unknown_model = GRID.replace("\"grid2d\"", "\"hexgrid\"");
    let builder = builder(&unknown_model);
    assert!(matches!(
        builder.build_simulation(),
        Err(SimError::ModelNotFound { .. })
    ));
}
