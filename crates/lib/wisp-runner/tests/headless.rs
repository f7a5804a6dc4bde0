use std::fs;

use wisp_core::control::{Pacing, RoundDriver, RunControl, RunState};
use wisp_core::error::SimError;
use wisp_output::result::{OutputSettings, OutputType, Outputs, Results};
use wisp_runner::runner::{run_headless, RunError};
use wisp_testutils::behavior::{FailsIn, Recorder};
use wisp_testutils::models::{static_models, LinkTable};
use wisp_testutils::sim::{create_simulation, place, test_project};

fn driver() -> RoundDriver {
    RoundDriver::new(RunControl::new(), Pacing::default())
}

#[test]
fn test_headless_run_writes_every_round() {
    let base = std::env::temp_dir().join(format!("wisp-runner-{}", std::process::id()));
    let settings = OutputSettings {
        output_interval: 3,
        output_path: "out".to_string(),
        outputs: vec![Outputs {
            output_type: OutputType::Topology,
            output_filename: "topology.csv".to_string(),
        }],
    };
    let results = Results::new(&base, &settings).unwrap();
    let files = results.output_path().to_path_buf();

    let links = LinkTable::default();
    links.connect(1, 2);
    let mut sim = create_simulation(test_project("headless"), 1.0);
    place(&mut sim, 1, 0.0, 0.0, static_models(links.model()), Recorder::new());
    place(&mut sim, 2, 5.0, 0.0, static_models(links.model()), Recorder::new());

    let state = run_headless(&mut sim, driver(), 5, Some(results)).unwrap();
    assert_eq!(state, RunState::Finished);
    let topology = fs::read_to_string(files.join("topology.csv")).unwrap();
    assert_eq!(topology.lines().count(), 6);
    assert_eq!(topology.lines().last(), Some("5,2,1"));
    fs::remove_dir_all(&base).unwrap();
}

#[test]
fn test_stop_before_the_first_round() {
    let mut sim = create_simulation(test_project("stopped"), 1.0);
    let links = LinkTable::default();
    place(&mut sim, 1, 0.0, 0.0, static_models(links.model()), Recorder::new());
    let driver = driver();
    driver.control().stop();
    assert_eq!(run_headless(&mut sim, driver, 5, None).unwrap(), RunState::Stopped);
    assert_eq!(sim.now().as_round(), 0);
}

#[test]
fn test_behavior_errors_surface_from_the_run() {
    let mut sim = create_simulation(test_project("failing"), 1.0);
    let links = LinkTable::default();
    place(&mut sim, 1, 0.0, 0.0, static_models(links.model()), FailsIn(2));
    let outcome = run_headless(&mut sim, driver(), 5, None);
    assert!(matches!(outcome, Err(RunError::Simulation(SimError::Config { .. }))));
    assert_eq!(sim.aborted_in(), Some(2));
}
