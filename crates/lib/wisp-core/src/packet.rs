use std::fmt;

use hashbrown::HashMap;
use typed_builder::TypedBuilder;

use crate::edge::EdgeRef;
use crate::message::{Message, TransmissionType};
use crate::node::NodeId;
use crate::time::SimTime;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketId(u64);

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PacketId {
    fn from(f: u64) -> Self {
        Self(f)
    }
}

impl PacketId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// The transport unit wrapping a message between two nodes.
///
/// Delivery can only be denied, never restored: once `positive_delivery` is false, the packet
/// is either returned to its origin as a NACK or discarded on arrival.
#[derive(Debug, Clone, TypedBuilder)]
pub struct Packet {
    id: PacketId,
    message: Box<dyn Message>,
    origin: NodeId,
    destination: NodeId,
    #[builder(default)]
    transmission: TransmissionType,
    #[builder(default)]
    edge: Option<EdgeRef>,
    #[builder(default)]
    pub sending_time: SimTime,
    #[builder(default)]
    pub arriving_time: SimTime,
    #[builder(default = 1.0)]
    pub intensity: f64,
    #[builder(default)]
    header_size: usize,
    #[builder(default = true, setter(skip))]
    positive_delivery: bool,
}

impl Packet {
    pub fn id(&self) -> PacketId {
        self.id
    }

    pub fn message(&self) -> &dyn Message {
        self.message.as_ref()
    }

    pub fn into_message(self) -> Box<dyn Message> {
        self.message
    }

    pub fn origin(&self) -> NodeId {
        self.origin
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    pub fn transmission(&self) -> TransmissionType {
        self.transmission
    }

    pub fn edge(&self) -> Option<EdgeRef> {
        self.edge
    }

    pub fn header_size(&self) -> usize {
        self.header_size
    }

    pub fn message_size(&self) -> usize {
        self.message.byte_size()
    }

    pub fn byte_size(&self) -> usize {
        self.header_size + self.message_size()
    }

    pub fn positive_delivery(&self) -> bool {
        self.positive_delivery
    }

    pub fn deny_delivery(&mut self) {
        self.positive_delivery = false;
    }

    pub fn attach_edge(&mut self, edge: EdgeRef) {
        self.edge = Some(edge);
    }

    /// Forgets the edge so that arrival no longer releases a count on it.
    pub fn detach_edge(&mut self) -> Option<EdgeRef> {
        self.edge.take()
    }
}

/// Owns every packet that has been sent and not yet consumed. Buffers and events only hold
/// the packet ids.
#[derive(Debug, Default, Clone)]
pub struct PacketArena {
    packets: HashMap<PacketId, Packet>,
    next_id: u64,
}

impl PacketArena {
    pub fn next_id(&mut self) -> PacketId {
        let id = PacketId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, packet: Packet) {
        self.packets.insert(packet.id(), packet);
    }

    pub fn get(&self, id: &PacketId) -> Option<&Packet> {
        self.packets.get(id)
    }

    pub fn get_mut(&mut self, id: &PacketId) -> Option<&mut Packet> {
        self.packets.get_mut(id)
    }

    pub fn remove(&mut self, id: &PacketId) -> Option<Packet> {
        self.packets.remove(id)
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Denies delivery of every packet bound to the given edge and detaches them from it.
    /// Returns how many packets were affected.
    pub fn invalidate_edge(&mut self, edge: &EdgeRef) -> usize {
        let mut count = 0;
        for packet in self.packets.values_mut() {
            if packet.edge.as_ref() == Some(edge) {
                packet.deny_delivery();
                packet.detach_edge();
                count += 1;
            }
        }
        count
    }
}
