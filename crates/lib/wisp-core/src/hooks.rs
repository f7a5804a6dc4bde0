use crate::behavior::{timer_request, Outgoing, Target, TimerRequest};
use crate::error::{SimError, SimResult};
use crate::message::{Message, TimerData};
use crate::node::{Node, NodeId, NodeMap};
use crate::statistics::Statistics;
use crate::time::SimTime;

/// Read access to the simulation for project logic, plus an outbox for messages sent on
/// behalf of nodes and for global timers.
pub struct GlobalContext<'a> {
    now: SimTime,
    nodes: &'a NodeMap,
    statistics: &'a Statistics,
    outbox: Vec<(NodeId, Outgoing)>,
    timers: Vec<TimerRequest>,
}

impl<'a> GlobalContext<'a> {
    pub(crate) fn new(now: SimTime, nodes: &'a NodeMap, statistics: &'a Statistics) -> Self {
        Self {
            now,
            nodes,
            statistics,
            outbox: Vec::new(),
            timers: Vec::new(),
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn nodes(&self) -> &NodeMap {
        self.nodes
    }

    pub fn node(&self, id: &NodeId) -> SimResult<&Node> {
        self.nodes.get(id).ok_or(SimError::NodeNotFound(*id))
    }

    pub fn statistics(&self) -> &Statistics {
        self.statistics
    }

    /// Sends a message from `origin` as if the node had sent it itself.
    pub fn send_from(
        &mut self,
        origin: NodeId,
        target: NodeId,
        message: impl Message,
    ) -> SimResult<()> {
        self.node(&origin)?;
        self.outbox.push((
            origin,
            Outgoing {
                target: Target::Node(target),
                message: Box::new(message),
                intensity: 1.0,
            },
        ));
        Ok(())
    }

    pub fn broadcast_from(&mut self, origin: NodeId, message: impl Message) -> SimResult<()> {
        self.node(&origin)?;
        self.outbox.push((
            origin,
            Outgoing {
                target: Target::Neighbors,
                message: Box::new(message),
                intensity: 1.0,
            },
        ));
        Ok(())
    }

    /// Sets a global timer. It fires at the start of a later round, before any node moves.
    pub fn set_timer(&mut self, delay: f64, data: impl TimerData) -> SimResult<()> {
        self.timers.push(timer_request(delay, Box::new(data))?);
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (Vec<(NodeId, Outgoing)>, Vec<TimerRequest>) {
        (self.outbox, self.timers)
    }
}

/// Project logic that runs outside of any single node. Every hook has a default so that a
/// project only implements what it needs.
pub trait GlobalHooks: Send {
    fn initialize(&mut self, _ctx: &mut GlobalContext) -> SimResult<()> {
        Ok(())
    }

    /// Runs at the start of every round, before the due global timers fire.
    fn pre_round(&mut self, _ctx: &mut GlobalContext) -> SimResult<()> {
        Ok(())
    }

    /// Runs after every node has stepped.
    fn post_round(&mut self, _ctx: &mut GlobalContext) -> SimResult<()> {
        Ok(())
    }

    fn has_terminated(&self, _ctx: &GlobalContext) -> bool {
        false
    }

    fn on_global_timer(
        &mut self,
        _ctx: &mut GlobalContext,
        _data: Box<dyn TimerData>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn on_exit(&mut self, _ctx: &GlobalContext) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl GlobalHooks for NoHooks {}
