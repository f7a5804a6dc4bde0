use std::collections::VecDeque;

use crate::message::Message;
use crate::packet::{Packet, PacketId};
use crate::time::SimTime;

/// Per-node buffer of packets that are on their way to the node. Packets are released once
/// their arrival time has been reached.
#[derive(Debug, Default, Clone)]
pub struct InboxPacketBuffer {
    pending: Vec<(SimTime, PacketId)>,
}

impl InboxPacketBuffer {
    pub fn add(&mut self, arriving_time: SimTime, packet: PacketId) {
        self.pending.push((arriving_time, packet));
    }

    /// Removes the packets that arrived at or before `now`, in arrival order.
    pub fn take_arrived(&mut self, now: SimTime) -> Vec<PacketId> {
        let (mut arrived, pending): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|(arriving_time, _)| *arriving_time <= now);
        self.pending = pending;
        arrived.sort();
        arrived.into_iter().map(|(_, packet)| packet).collect()
    }

    /// Removes every buffered packet, arrived or not.
    pub fn take_all(&mut self) -> Vec<PacketId> {
        self.pending.drain(..).map(|(_, packet)| packet).collect()
    }

    pub fn contains(&self, packet: &PacketId) -> bool {
        self.pending.iter().any(|(_, id)| id == packet)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// The packets handed to a node in one call.
#[derive(Debug, Default)]
pub struct Inbox {
    packets: VecDeque<Packet>,
}

impl Inbox {
    pub fn new(packets: Vec<Packet>) -> Self {
        Self {
            packets: packets.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter()
    }

    /// Packets whose message is of type `M`, together with the typed message.
    pub fn messages_of<M: Message>(&self) -> impl Iterator<Item = (&Packet, &M)> {
        self.packets.iter().filter_map(|packet| {
            packet
                .message()
                .downcast_ref::<M>()
                .map(|message| (packet, message))
        })
    }
}

impl Iterator for Inbox {
    type Item = Packet;

    fn next(&mut self) -> Option<Self::Item> {
        self.packets.pop_front()
    }
}
