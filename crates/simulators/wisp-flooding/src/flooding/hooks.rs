use log::{debug, info};

use wisp_core::error::SimResult;
use wisp_core::hooks::{GlobalContext, GlobalHooks};
use wisp_core::node::NodeMap;

use crate::flooding::relay::Relay;

fn relays(nodes: &NodeMap) -> impl Iterator<Item = &Relay> {
    nodes
        .values()
        .filter_map(|node| node.behavior_as::<Relay>())
}

/// Number of relays that have seen each flood started so far.
pub fn coverage(nodes: &NodeMap) -> Vec<usize> {
    let issued = relays(nodes)
        .filter(|relay| relay.is_source())
        .map(|relay| relay.issued())
        .max()
        .unwrap_or_default();
    (0..issued)
        .map(|seq| relays(nodes).filter(|relay| relay.has_seen(seq)).count())
        .collect()
}

/// Tracks how far the floods spread. The run is complete once every flood has been started
/// and has reached every node.
#[derive(Debug, Default)]
pub struct FloodHooks {
    floods: u32,
    coverage: Vec<usize>,
}

impl FloodHooks {
    pub fn new(floods: u32) -> Self {
        Self {
            floods,
            coverage: Vec::new(),
        }
    }
}

impl GlobalHooks for FloodHooks {
    fn initialize(&mut self, ctx: &mut GlobalContext) -> SimResult<()> {
        info!(
            "Flooding {} times over {} nodes",
            self.floods,
            ctx.nodes().len()
        );
        Ok(())
    }

    fn post_round(&mut self, ctx: &mut GlobalContext) -> SimResult<()> {
        let coverage = coverage(ctx.nodes());
        if coverage != self.coverage {
            debug!("Round {}: coverage {:?}", ctx.now().as_round(), coverage);
            self.coverage = coverage;
        }
        Ok(())
    }

    fn has_terminated(&self, ctx: &GlobalContext) -> bool {
        let nodes = ctx.nodes().len();
        self.coverage.len() == self.floods as usize
            && self.coverage.iter().all(|reached| *reached == nodes)
    }

    fn on_exit(&mut self, ctx: &GlobalContext) {
        let nodes = ctx.nodes().len();
        for (seq, reached) in coverage(ctx.nodes()).iter().enumerate() {
            info!("Flood {} reached {} of {} nodes", seq, reached, nodes);
        }
    }
}
