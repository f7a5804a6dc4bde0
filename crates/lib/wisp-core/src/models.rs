//! Contracts of the pluggable models. Each model makes exactly one decision for the kernel;
//! concrete implementations live outside the kernel and are resolved through the
//! [`registry`](crate::registry).

use crate::air::AirView;
use crate::error::SimResult;
use crate::message::Message;
use crate::node::NodeId;
use crate::packet::Packet;
use crate::position::{Dimensions, Position};
use crate::time::SimTime;

/// What a model gets to see of a node.
#[derive(Clone, Copy, Debug)]
pub struct NodeView<'a> {
    pub id: NodeId,
    pub position: &'a Position,
}

impl<'a> NodeView<'a> {
    pub fn new(id: NodeId, position: &'a Position) -> Self {
        Self { id, position }
    }
}

/// Decides where a node moves to in the next round.
pub trait MobilityModel: Send {
    fn next_position(
        &mut self,
        node: NodeView,
        dims: &Dimensions,
        now: SimTime,
    ) -> SimResult<Position>;
}

/// Decides whether `from` has a directed edge to `to`. Implementations are free to be
/// asymmetric, the kernel never infers the reverse edge.
pub trait ConnectivityModel: Send {
    fn is_connected(&mut self, from: NodeView, to: NodeView) -> SimResult<bool>;
}

/// Decides whether a packet arriving at the node owning this model is disturbed by the
/// other packets in the air.
pub trait InterferenceModel: Send {
    fn is_disturbed(&self, packet: &Packet, air: &AirView) -> SimResult<bool>;
}

/// Decides at send time whether a packet reaches its destination at all.
pub trait ReliabilityModel: Send {
    fn reaches_destination(&mut self, packet: &Packet) -> SimResult<bool>;
}

/// Decides how long a message takes from one node to another.
pub trait MessageTransmissionModel: Send {
    fn time_to_reach(
        &mut self,
        from: NodeView,
        to: NodeView,
        message: &dyn Message,
    ) -> SimResult<f64>;
}

/// Supplies the initial positions of a batch of nodes.
pub trait DistributionModel: Send {
    fn initialize(&mut self, node_count: usize, dims: &Dimensions) -> SimResult<()>;
    fn next_position(&mut self) -> SimResult<Position>;
}

/// The model set assigned to one node.
pub struct NodeModels {
    pub mobility: Box<dyn MobilityModel>,
    pub connectivity: Box<dyn ConnectivityModel>,
    pub interference: Box<dyn InterferenceModel>,
    pub reliability: Box<dyn ReliabilityModel>,
}

impl std::fmt::Debug for NodeModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeModels").finish_non_exhaustive()
    }
}
