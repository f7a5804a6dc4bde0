use indexmap::IndexMap;
use log::debug;

use crate::air::PacketsInTheAir;
use crate::collection::NodeCollection;
use crate::edge::Edge;
use crate::error::SimResult;
use crate::inbox::InboxPacketBuffer;
use crate::node::NodeId;
use crate::packet::{Packet, PacketArena};
use crate::position::{Point3, Position};
use crate::simulation::Simulation;
use crate::time::SimTime;
use crate::timer::TimerSet;

struct NodeState {
    point: Point3,
    outgoing: IndexMap<NodeId, Edge>,
    inbox_buffer: InboxPacketBuffer,
    nack_box: Vec<Packet>,
    timers: TimerSet,
    neighborhood_changed: bool,
}

/// The kernel state at the end of the last completed round: positions, graph, packets,
/// buffers and timers. Behaviors, hooks and models own their state and are not covered.
pub(super) struct RoundCheckpoint {
    now: SimTime,
    even_round: bool,
    edge_serial: u64,
    timer_serial: u64,
    nodes: IndexMap<NodeId, NodeState>,
    packets: PacketArena,
    air: PacketsInTheAir,
    global_timers: TimerSet,
}

impl Simulation {
    pub(super) fn checkpoint(&mut self) -> SimResult<RoundCheckpoint> {
        let nodes = self
            .nodes
            .iter()
            .map(|(id, node)| {
                let state = NodeState {
                    point: node.position.point()?,
                    outgoing: node.outgoing.clone(),
                    inbox_buffer: node.inbox_buffer.clone(),
                    nack_box: node.nack_box.clone(),
                    timers: node.timers.clone(),
                    neighborhood_changed: node.neighborhood_changed,
                };
                Ok((*id, state))
            })
            .collect::<SimResult<_>>()?;
        self.statistics.checkpoint();
        Ok(RoundCheckpoint {
            now: self.now,
            even_round: self.even_round,
            edge_serial: self.edge_serial,
            timer_serial: self.timer_serial,
            nodes,
            packets: self.packets.clone(),
            air: self.air.clone(),
            global_timers: self.global_timers.clone(),
        })
    }

    pub(super) fn commit(&mut self) {
        self.statistics.commit();
    }

    /// Puts the kernel back to the checkpoint, moving repositioned nodes back in the index.
    pub(super) fn restore(&mut self, checkpoint: RoundCheckpoint) {
        self.statistics.rollback();
        self.now = checkpoint.now;
        self.even_round = checkpoint.even_round;
        self.edge_serial = checkpoint.edge_serial;
        self.timer_serial = checkpoint.timer_serial;
        self.packets = checkpoint.packets;
        self.air = checkpoint.air;
        self.global_timers = checkpoint.global_timers;

        let mut moved_back = 0;
        for (id, state) in checkpoint.nodes {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            if node.position.point().ok() != Some(state.point) {
                self.index.reposition(id, state.point);
                node.position = Position::from(state.point);
                moved_back += 1;
            }
            node.outgoing = state.outgoing;
            node.inbox_buffer = state.inbox_buffer;
            node.nack_box = state.nack_box;
            node.timers = state.timers;
            node.neighborhood_changed = state.neighborhood_changed;
        }
        debug!("Restored round {} and moved {} nodes back", self.now.as_round(), moved_back);
    }
}
