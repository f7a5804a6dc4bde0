use wisp_core::behavior::NodeBehavior;
use wisp_core::hooks::NoHooks;
use wisp_core::models::NodeModels;
use wisp_core::node::NodeId;
use wisp_core::position::{Dimensions, Position};
use wisp_core::project::Project;
use wisp_core::registry::ModelSettings;
use wisp_core::simulation::Simulation;

use crate::models::FixedDelay;

pub fn area() -> Dimensions {
    Dimensions::builder()
        .dim_x([0.0, 100.0])
        .dim_y([0.0, 100.0])
        .build()
}

/// A synchronous project without mobility over a 100 x 100 area.
pub fn test_project(name: &str) -> Project {
    Project::builder()
        .name(name)
        .dimensions(area())
        .mobility_enabled(false)
        .message_transmission(ModelSettings::named("test:fixed"))
        .build()
}

pub fn create_simulation(project: Project, delay: f64) -> Simulation {
    Simulation::new(project, Box::new(FixedDelay(delay)), Box::new(NoHooks))
        .expect("test project is valid")
}

pub fn place(
    sim: &mut Simulation,
    id: u64,
    x: f64,
    y: f64,
    models: NodeModels,
    behavior: impl NodeBehavior,
) {
    sim.add_node(
        NodeId::from(id),
        models,
        Box::new(behavior),
        Position::at(x, y, 0.0),
    )
    .expect("node can be placed");
}

/// Typed access to a node's behavior.
pub fn behavior_of<B: NodeBehavior>(sim: &Simulation, id: u64) -> &B {
    sim.node(&NodeId::from(id))
        .expect("node exists")
        .behavior_as::<B>()
        .expect("behavior has the requested type")
}
