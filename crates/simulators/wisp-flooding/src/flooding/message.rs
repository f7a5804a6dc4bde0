use wisp_core::message::Message;
use wisp_core::node::NodeId;

/// Bytes of a flood besides its payload: sequence number, origin and hop count.
pub const FLOOD_HEADER_SIZE: usize = 16;

/// One copy of a flood. Relays forward it with `hops` increased by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flood {
    pub seq: u32,
    pub origin: NodeId,
    pub hops: u32,
    pub payload_size: usize,
}

impl Flood {
    pub fn relayed(&self) -> Self {
        Self {
            hops: self.hops + 1,
            ..*self
        }
    }
}

impl Message for Flood {
    fn byte_size(&self) -> usize {
        FLOOD_HEADER_SIZE + self.payload_size
    }
}
