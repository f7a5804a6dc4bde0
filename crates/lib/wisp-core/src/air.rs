use indexmap::IndexSet;
use log::{debug, trace};

use crate::error::{SimError, SimResult};
use crate::node::{NodeId, NodeMap};
use crate::packet::{Packet, PacketArena, PacketId};
use crate::position::Position;

/// What an interference model gets to see of the packets currently in the air.
pub struct AirView<'a> {
    packets: &'a PacketArena,
    active: &'a IndexSet<PacketId>,
    nodes: &'a NodeMap,
}

impl<'a> AirView<'a> {
    pub fn new(
        packets: &'a PacketArena,
        active: &'a IndexSet<PacketId>,
        nodes: &'a NodeMap,
    ) -> Self {
        Self {
            packets,
            active,
            nodes,
        }
    }

    /// Packets that interfere with each other.
    pub fn active_packets(&self) -> impl Iterator<Item = &Packet> {
        self.active.iter().filter_map(|id| self.packets.get(id))
    }

    pub fn position_of(&self, node: &NodeId) -> SimResult<&Position> {
        self.nodes
            .get(node)
            .map(|node| node.position())
            .ok_or(SimError::NodeNotFound(*node))
    }
}

/// Packets currently travelling, split into active packets (they interfere and can be
/// disturbed) and passive packets (they can be disturbed but do not interfere).
///
/// With additive interference a new packet can only add interference, so the test is
/// postponed until right before the next removal. Without it every insertion and removal
/// triggers a test.
#[derive(Debug, Default, Clone)]
pub struct PacketsInTheAir {
    active: IndexSet<PacketId>,
    passive: IndexSet<PacketId>,
    additive: bool,
    untested_insertions: bool,
}

impl PacketsInTheAir {
    pub fn new(additive: bool) -> Self {
        Self {
            additive,
            ..Default::default()
        }
    }

    /// Adds a packet that interferes with the others.
    pub fn add(
        &mut self,
        packet: PacketId,
        packets: &mut PacketArena,
        nodes: &NodeMap,
    ) -> SimResult<()> {
        self.active.insert(packet);
        trace!("Packet {} is in the air", packet);
        self.inserted(packets, nodes)
    }

    /// Adds a packet that is tested like any other but adds no interference.
    pub fn add_passive(
        &mut self,
        packet: PacketId,
        packets: &mut PacketArena,
        nodes: &NodeMap,
    ) -> SimResult<()> {
        self.passive.insert(packet);
        trace!("Packet {} is in the air without interfering", packet);
        self.inserted(packets, nodes)
    }

    fn inserted(&mut self, packets: &mut PacketArena, nodes: &NodeMap) -> SimResult<()> {
        if self.additive {
            self.untested_insertions = true;
            return Ok(());
        }
        self.test_for_interference(packets, nodes)?;
        Ok(())
    }

    /// Takes a packet out of the air. Returns false if the packet was not in the air.
    pub fn remove(
        &mut self,
        packet: PacketId,
        packets: &mut PacketArena,
        nodes: &NodeMap,
    ) -> SimResult<bool> {
        if !self.contains(&packet) {
            return Ok(false);
        }
        if self.additive && self.untested_insertions {
            self.test_for_interference(packets, nodes)?;
        }
        let removed = self.active.shift_remove(&packet) || self.passive.shift_remove(&packet);
        if !self.additive {
            self.test_for_interference(packets, nodes)?;
        }
        Ok(removed)
    }

    /// Asks the destination of every packet in the air whether the packet is disturbed and
    /// denies delivery of those that are. Returns how many packets were newly denied.
    pub fn test_for_interference(
        &mut self,
        packets: &mut PacketArena,
        nodes: &NodeMap,
    ) -> SimResult<usize> {
        self.untested_insertions = false;
        let mut disturbed = Vec::new();
        {
            let view = AirView::new(packets, &self.active, nodes);
            for id in self.active.iter().chain(self.passive.iter()) {
                let Some(packet) = packets.get(id) else {
                    continue;
                };
                if !packet.positive_delivery() {
                    continue;
                }
                let destination = nodes
                    .get(&packet.destination())
                    .ok_or(SimError::NodeNotFound(packet.destination()))?;
                if destination.models.interference.is_disturbed(packet, &view)? {
                    disturbed.push(*id);
                }
            }
        }
        for id in disturbed.iter() {
            if let Some(packet) = packets.get_mut(id) {
                packet.deny_delivery();
            }
        }
        if !disturbed.is_empty() {
            debug!("Interference denied delivery of {} packets", disturbed.len());
        }
        Ok(disturbed.len())
    }

    /// Forgets packets that no longer exist, without testing for interference.
    pub fn forget_missing(&mut self, packets: &PacketArena) {
        self.active.retain(|id| packets.get(id).is_some());
        self.passive.retain(|id| packets.get(id).is_some());
    }

    pub fn contains(&self, packet: &PacketId) -> bool {
        self.active.contains(packet) || self.passive.contains(packet)
    }

    pub fn is_additive(&self) -> bool {
        self.additive
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn passive_len(&self) -> usize {
        self.passive.len()
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.passive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.passive.is_empty()
    }
}
