use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::behavior::NodeBehavior;
use crate::edge::{Edge, EdgeRef};
use crate::error::SimResult;
use crate::inbox::InboxPacketBuffer;
use crate::models::{NodeModels, NodeView};
use crate::packet::Packet;
use crate::position::Position;
use crate::timer::TimerSet;

/// Stable identity of a node in the simulation.
#[derive(Deserialize, Default, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.parse::<u64>()?;
        Ok(Self(id))
    }
}

impl From<u64> for NodeId {
    fn from(f: u64) -> Self {
        Self(f)
    }
}

impl NodeId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

pub type NodeMap = IndexMap<NodeId, Node>;

/// An addressable simulation actor. The kernel owns the node's position, edges, buffers and
/// timers; what the node does with its messages is up to its [`NodeBehavior`].
pub struct Node {
    id: NodeId,
    pub(crate) position: Position,
    pub(crate) models: NodeModels,
    pub(crate) outgoing: IndexMap<NodeId, Edge>,
    pub(crate) inbox_buffer: InboxPacketBuffer,
    pub(crate) nack_box: Vec<Packet>,
    pub(crate) timers: TimerSet,
    pub(crate) behavior: Box<dyn NodeBehavior>,
    pub(crate) neighborhood_changed: bool,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("edges", &self.outgoing.len())
            .field("buffered", &self.inbox_buffer.len())
            .field("timers", &self.timers.len())
            .finish()
    }
}

impl Node {
    /// A node that has not been placed yet.
    pub fn new(id: NodeId, models: NodeModels, behavior: Box<dyn NodeBehavior>) -> Self {
        Self {
            id,
            position: Position::inert(),
            models,
            outgoing: IndexMap::new(),
            inbox_buffer: InboxPacketBuffer::default(),
            nack_box: Vec::new(),
            timers: TimerSet::default(),
            behavior,
            neighborhood_changed: false,
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn view(&self) -> NodeView {
        NodeView::new(self.id, &self.position)
    }

    pub fn edge_to(&self, target: &NodeId) -> Option<&Edge> {
        self.outgoing.get(target)
    }

    pub fn has_edge_to(&self, target: &NodeId) -> bool {
        self.outgoing.contains_key(target)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.outgoing.values()
    }

    pub fn neighbors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing.keys().copied()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.len()
    }

    pub fn neighborhood_changed(&self) -> bool {
        self.neighborhood_changed
    }

    pub fn buffered_packets(&self) -> usize {
        self.inbox_buffer.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn behavior(&self) -> &dyn NodeBehavior {
        self.behavior.as_ref()
    }

    /// The node's behavior as its concrete type.
    pub fn behavior_as<B: NodeBehavior>(&self) -> Option<&B> {
        self.behavior.downcast_ref::<B>()
    }

    /// Releases one packet from the given edge. Returns false if the edge no longer exists,
    /// in which case the packet was already invalidated together with it.
    pub(crate) fn release(&mut self, edge: &EdgeRef) -> SimResult<bool> {
        match self.outgoing.get_mut(&edge.id.target) {
            Some(current) if current.is(edge) => {
                current.remove_packet()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Releases the edge a packet travels on, if it still has one.
pub(crate) fn release_edge_of(packet: &Packet, nodes: &mut NodeMap) -> SimResult<bool> {
    let Some(edge) = packet.edge() else {
        return Ok(false);
    };
    match nodes.get_mut(&edge.id.source) {
        Some(source) => source.release(&edge),
        None => Ok(false),
    }
}
