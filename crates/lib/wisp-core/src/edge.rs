use std::fmt;

use log::trace;

use crate::error::{SimError, SimResult};
use crate::node::NodeId;
use crate::packet::Packet;

/// Identity of a directed edge. Displayed as `"source:target"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId {
    pub source: NodeId,
    pub target: NodeId,
}

impl EdgeId {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.target)
    }
}

/// What a packet keeps about the edge it travels on. The serial tells apart an edge from a
/// later edge between the same pair, so a packet sent over a removed edge never releases the
/// count of its replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeRef {
    pub id: EdgeId,
    pub serial: u64,
}

/// A directed connectivity relation that counts the packets currently travelling over it.
#[derive(Debug, Clone)]
pub struct Edge {
    id: EdgeId,
    serial: u64,
    packet_count: u64,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, serial: u64) -> Self {
        Self {
            id: EdgeId::new(source, target),
            serial,
            packet_count: 0,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn source(&self) -> NodeId {
        self.id.source
    }

    pub fn target(&self) -> NodeId {
        self.id.target
    }

    pub fn to_ref(&self) -> EdgeRef {
        EdgeRef {
            id: self.id,
            serial: self.serial,
        }
    }

    pub fn is(&self, edge_ref: &EdgeRef) -> bool {
        self.id == edge_ref.id && self.serial == edge_ref.serial
    }

    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    pub fn add_packet(&mut self, packet: &Packet) -> SimResult<()> {
        if packet.origin() != self.id.source || packet.destination() != self.id.target {
            return Err(SimError::EdgeMismatch {
                edge: self.id,
                origin: packet.origin(),
                destination: packet.destination(),
            });
        }
        self.packet_count += 1;
        trace!("Edge {} now carries {} packets", self.id, self.packet_count);
        Ok(())
    }

    pub fn remove_packet(&mut self) -> SimResult<()> {
        self.packet_count = self
            .packet_count
            .checked_sub(1)
            .ok_or(SimError::EdgeUnderflow(self.id))?;
        Ok(())
    }
}
