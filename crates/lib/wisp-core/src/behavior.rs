use downcast_rs::{impl_downcast, Downcast};
use indexmap::IndexMap;

use crate::edge::Edge;
use crate::error::{SimError, SimResult};
use crate::inbox::Inbox;
use crate::message::{Message, TimerData};
use crate::node::NodeId;
use crate::position::Position;
use crate::time::SimTime;

/// Where an outgoing message should go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Node(NodeId),
    Neighbors,
}

#[derive(Debug)]
pub struct Outgoing {
    pub target: Target,
    pub message: Box<dyn Message>,
    pub intensity: f64,
}

#[derive(Debug)]
pub struct TimerRequest {
    pub delay: f64,
    pub data: Box<dyn TimerData>,
}

pub(crate) fn timer_request(delay: f64, data: Box<dyn TimerData>) -> SimResult<TimerRequest> {
    if !(delay > 0.0 && delay.is_finite()) {
        return Err(SimError::InvalidTimerDelay(delay));
    }
    Ok(TimerRequest { delay, data })
}

/// What a node sees of the simulation during one of its callbacks. Messages and timers are
/// collected here and handed to the kernel once the callback returns.
pub struct NodeContext<'a> {
    id: NodeId,
    now: SimTime,
    position: &'a Position,
    outgoing: &'a IndexMap<NodeId, Edge>,
    outbox: Vec<Outgoing>,
    timers: Vec<TimerRequest>,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(
        id: NodeId,
        now: SimTime,
        position: &'a Position,
        outgoing: &'a IndexMap<NodeId, Edge>,
    ) -> Self {
        Self {
            id,
            now,
            position,
            outgoing,
            outbox: Vec::new(),
            timers: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn position(&self) -> &Position {
        self.position
    }

    pub fn neighbors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing.keys().copied()
    }

    pub fn neighbor_count(&self) -> usize {
        self.outgoing.len()
    }

    pub fn is_neighbor(&self, node: &NodeId) -> bool {
        self.outgoing.contains_key(node)
    }

    pub fn send(&mut self, target: NodeId, message: impl Message) {
        self.send_with_intensity(target, message, 1.0);
    }

    pub fn send_with_intensity(&mut self, target: NodeId, message: impl Message, intensity: f64) {
        self.outbox.push(Outgoing {
            target: Target::Node(target),
            message: Box::new(message),
            intensity,
        });
    }

    /// Sends a copy of the message over every outgoing edge.
    pub fn broadcast(&mut self, message: impl Message) {
        self.outbox.push(Outgoing {
            target: Target::Neighbors,
            message: Box::new(message),
            intensity: 1.0,
        });
    }

    /// Fires `data` back at this node after `delay` time units. The delay must be positive.
    pub fn set_timer(&mut self, delay: f64, data: impl TimerData) -> SimResult<()> {
        self.timers.push(timer_request(delay, Box::new(data))?);
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (Vec<Outgoing>, Vec<TimerRequest>) {
        (self.outbox, self.timers)
    }
}

/// Project-specific logic of a node. The kernel calls these in a fixed order every round:
/// `pre_step`, `neighborhood_change` (only if the outgoing edges changed), `on_timer` for each
/// due timer, `handle_messages`, `handle_nack_messages` (only with NACKs enabled) and
/// `post_step`.
///
/// Errors returned from any callback abort the run.
pub trait NodeBehavior: Downcast + Send {
    fn init(&mut self, _ctx: &mut NodeContext) -> SimResult<()> {
        Ok(())
    }

    fn pre_step(&mut self, _ctx: &mut NodeContext) -> SimResult<()> {
        Ok(())
    }

    fn neighborhood_change(&mut self, _ctx: &mut NodeContext) -> SimResult<()> {
        Ok(())
    }

    fn on_timer(&mut self, _ctx: &mut NodeContext, _data: Box<dyn TimerData>) -> SimResult<()> {
        Ok(())
    }

    fn handle_messages(&mut self, ctx: &mut NodeContext, inbox: Inbox) -> SimResult<()>;

    /// Packets this node sent that were not delivered.
    fn handle_nack_messages(&mut self, _ctx: &mut NodeContext, _nacks: Inbox) -> SimResult<()> {
        Ok(())
    }

    fn post_step(&mut self, _ctx: &mut NodeContext) -> SimResult<()> {
        Ok(())
    }
}

impl_downcast!(NodeBehavior);

/// A behavior that ignores everything it receives.
#[derive(Debug, Default, Clone, Copy)]
pub struct Idle;

impl NodeBehavior for Idle {
    fn handle_messages(&mut self, _ctx: &mut NodeContext, _inbox: Inbox) -> SimResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::SizedMessage;

    #[test]
    fn non_positive_timer_delays_are_rejected() {
        let position = Position::at(0.0, 0.0, 0.0);
        let edges = IndexMap::new();
        let mut ctx = NodeContext::new(NodeId::from(1), SimTime::from(1), &position, &edges);
        assert_eq!(ctx.set_timer(0.0, ()), Err(SimError::InvalidTimerDelay(0.0)));
        assert_eq!(
            ctx.set_timer(-2.5, ()),
            Err(SimError::InvalidTimerDelay(-2.5))
        );
        assert!(ctx.set_timer(f64::NAN, ()).is_err());
        assert!(ctx.set_timer(0.5, ()).is_ok());

        ctx.broadcast(SizedMessage(4));
        let (outbox, timers) = ctx.into_parts();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].target, Target::Neighbors);
        assert_eq!(timers.len(), 1);
    }
}
