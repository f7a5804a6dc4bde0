//! The aggregate root of a run: nodes, graph, packet buffers, statistics and time.

use std::fmt;

use log::{debug, error, info};

use crate::air::PacketsInTheAir;
use crate::behavior::{NodeBehavior, NodeContext};
use crate::collection::{NodeCollection, NodeIndex};
use crate::edge::Edge;
use crate::error::{SimError, SimResult};
use crate::event::{EventQueue, EventQueueListener};
use crate::hooks::{GlobalContext, GlobalHooks};
use crate::models::{DistributionModel, MessageTransmissionModel, NodeModels};
use crate::node::{Node, NodeId, NodeMap};
use crate::packet::PacketArena;
use crate::position::Position;
use crate::project::Project;
use crate::registry::ModelRegistry;
use crate::statistics::Statistics;
use crate::time::SimTime;
use crate::timer::TimerSet;

mod async_mode;
mod checkpoint;
mod connectivity;
mod dispatch;
mod round;

/// A read-only picture of the simulation for hosts and renderers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationSummary {
    pub round: u64,
    pub nodes: usize,
    pub edges: usize,
    pub sent_messages: u64,
    pub received_messages: u64,
    pub dropped_messages: u64,
    pub packets_in_flight: usize,
}

pub struct Simulation {
    project: Project,
    hooks: Box<dyn GlobalHooks>,
    transmission: Box<dyn MessageTransmissionModel>,
    nodes: NodeMap,
    index: NodeIndex,
    packets: PacketArena,
    air: PacketsInTheAir,
    statistics: Statistics,
    global_timers: TimerSet,
    events: EventQueue,
    now: SimTime,
    even_round: bool,
    edge_serial: u64,
    timer_serial: u64,
    initialized: bool,
    aborted_in: Option<u64>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("project", &self.project.name)
            .field("now", &self.now)
            .field("nodes", &self.nodes.len())
            .field("packets", &self.packets.len())
            .field("aborted_in", &self.aborted_in)
            .finish()
    }
}

impl Simulation {
    /// Validates the project and creates an empty simulation at time zero.
    pub fn new(
        project: Project,
        transmission: Box<dyn MessageTransmissionModel>,
        hooks: Box<dyn GlobalHooks>,
    ) -> SimResult<Self> {
        project.validate()?;
        let index = NodeIndex::new(
            project.collection,
            project.connection_radius().unwrap_or_default(),
        );
        info!(
            "Created simulation {} ({} mode)",
            project.name,
            if project.asynchronous { "asynchronous" } else { "synchronous" }
        );
        Ok(Self {
            air: PacketsInTheAir::new(project.additive_interference),
            statistics: Statistics::new(project.keep_round_statistics),
            project,
            hooks,
            transmission,
            nodes: NodeMap::new(),
            index,
            packets: PacketArena::default(),
            global_timers: TimerSet::default(),
            events: EventQueue::default(),
            now: SimTime::ZERO,
            even_round: true,
            edge_serial: 0,
            timer_serial: 0,
            initialized: false,
            aborted_in: None,
        })
    }

    /// Resolves the project's message transmission model through the registry.
    pub fn from_registry(
        project: Project,
        registry: &ModelRegistry,
        hooks: Box<dyn GlobalHooks>,
    ) -> SimResult<Self> {
        project.validate()?;
        let transmission = registry.transmission(&project.message_transmission)?;
        Self::new(project, transmission, hooks)
    }

    /// Adds a placed node. Inert positions and duplicate ids are rejected.
    pub fn add_node(
        &mut self,
        id: NodeId,
        models: NodeModels,
        behavior: Box<dyn NodeBehavior>,
        position: Position,
    ) -> SimResult<()> {
        let point = position.point()?;
        if self.nodes.contains_key(&id) {
            return Err(SimError::DuplicateNode(id));
        }
        self.index.insert(id, point);
        self.nodes
            .insert(id, Node::new(id, models, behavior).with_position(position));
        debug!("Added node {} at {}", id, point);
        if self.initialized {
            self.with_behavior(id, |behavior, ctx| behavior.init(ctx))?;
        }
        Ok(())
    }

    /// Places `count` new nodes with positions from the distribution model. Ids continue after
    /// the largest id in use.
    pub fn place_nodes<F>(
        &mut self,
        distribution: &mut dyn DistributionModel,
        count: usize,
        mut make: F,
    ) -> SimResult<Vec<NodeId>>
    where
        F: FnMut(NodeId) -> SimResult<(NodeModels, Box<dyn NodeBehavior>)>,
    {
        distribution.initialize(count, &self.project.dimensions)?;
        let first = self
            .nodes
            .keys()
            .map(|id| id.as_u64() + 1)
            .max()
            .unwrap_or_default();
        let mut placed = Vec::with_capacity(count);
        for offset in 0..count as u64 {
            let id = NodeId::from(first + offset);
            let position = distribution.next_position()?;
            let (models, behavior) = make(id)?;
            self.add_node(id, models, behavior, position)?;
            placed.push(id);
        }
        info!("Placed {} nodes", placed.len());
        Ok(placed)
    }

    /// Evaluates connectivity once and runs the initialisation of the nodes and the project.
    /// Called by the first round or event if the host did not call it before.
    pub fn initialize(&mut self) -> SimResult<()> {
        self.ensure_running()?;
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;
        if let Err(e) = self.initialize_models() {
            let round = self.now.as_round();
            error!("Initialization in round {} failed: {}", round, e);
            self.aborted_in = Some(round);
            return Err(e);
        }
        info!("Initialized simulation with {} nodes", self.nodes.len());
        Ok(())
    }

    fn initialize_models(&mut self) -> SimResult<()> {
        if self.project.connectivity_enabled {
            self.reevaluate_connections()?;
        }
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.with_behavior(id, |behavior, ctx| behavior.init(ctx))?;
        }
        self.with_hooks(|hooks, ctx| hooks.initialize(ctx))
    }

    /// Whether the project considers the run complete.
    pub fn has_terminated(&self) -> bool {
        let ctx = GlobalContext::new(self.now, &self.nodes, &self.statistics);
        self.hooks.has_terminated(&ctx)
    }

    /// Lets the project wrap up. The simulation can still be inspected afterwards.
    pub fn finish(&mut self) {
        let ctx = GlobalContext::new(self.now, &self.nodes, &self.statistics);
        self.hooks.on_exit(&ctx);
        info!(
            "Simulation {} finished at {} with {} sent and {} received messages",
            self.project.name,
            self.now,
            self.statistics.sent_messages(),
            self.statistics.received_messages()
        );
    }

    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            round: self.now.as_round(),
            nodes: self.nodes.len(),
            edges: self.edge_count(),
            sent_messages: self.statistics.sent_messages(),
            received_messages: self.statistics.received_messages(),
            dropped_messages: self.statistics.dropped_messages(),
            packets_in_flight: self.packets.len(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Parity of the current round, for models that alternate between rounds.
    pub fn is_even_round(&self) -> bool {
        self.even_round
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn node(&self, id: &NodeId) -> SimResult<&Node> {
        self.nodes.get(id).ok_or(SimError::NodeNotFound(*id))
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.nodes.values().flat_map(|node| node.edges())
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.edge_count()).sum()
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn packets(&self) -> &PacketArena {
        &self.packets
    }

    pub fn air(&self) -> &PacketsInTheAir {
        &self.air
    }

    pub fn index(&self) -> &NodeIndex {
        &self.index
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn add_event_listener(&mut self, listener: Box<dyn EventQueueListener>) {
        self.events.add_listener(listener);
    }

    /// The round an earlier error aborted, if any.
    pub fn aborted_in(&self) -> Option<u64> {
        self.aborted_in
    }

    fn ensure_running(&self) -> SimResult<()> {
        match self.aborted_in {
            Some(round) => Err(SimError::Aborted { round }),
            None => Ok(()),
        }
    }

    /// Runs one behavior callback of a node and hands its messages and timers to the kernel.
    fn with_behavior<F>(&mut self, id: NodeId, call: F) -> SimResult<()>
    where
        F: FnOnce(&mut dyn NodeBehavior, &mut NodeContext) -> SimResult<()>,
    {
        let now = self.now;
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(SimError::NodeNotFound(id))?;
        let mut ctx = NodeContext::new(id, now, &node.position, &node.outgoing);
        call(node.behavior.as_mut(), &mut ctx)?;
        let (outbox, timers) = ctx.into_parts();
        self.schedule_node_timers(id, timers)?;
        for outgoing in outbox {
            self.dispatch(id, outgoing)?;
        }
        Ok(())
    }

    /// Runs one project hook and hands its messages and timers to the kernel.
    fn with_hooks<F>(&mut self, call: F) -> SimResult<()>
    where
        F: FnOnce(&mut dyn GlobalHooks, &mut GlobalContext) -> SimResult<()>,
    {
        let mut ctx = GlobalContext::new(self.now, &self.nodes, &self.statistics);
        call(self.hooks.as_mut(), &mut ctx)?;
        let (outbox, timers) = ctx.into_parts();
        self.schedule_global_timers(timers);
        for (origin, outgoing) in outbox {
            self.dispatch(origin, outgoing)?;
        }
        Ok(())
    }
}
