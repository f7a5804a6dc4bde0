use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use crate::collection::NodeCollection;
use crate::edge::Edge;
use crate::error::{SimError, SimResult};
use crate::models::NodeView;
use crate::node::NodeId;
use crate::packet::PacketArena;
use crate::position::Position;
use crate::simulation::Simulation;

impl Simulation {
    /// Asks every mobility model for the next position and then moves all nodes at once, so no
    /// model sees a node that already moved in this round.
    pub(super) fn move_nodes(&mut self) -> SimResult<()> {
        let dims = self.project.dimensions;
        let now = self.now;
        let mut moves = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.values_mut() {
            let view = NodeView::new(node.id(), &node.position);
            let next = node.models.mobility.next_position(view, &dims, now)?;
            moves.push((node.id(), next.crop(&dims)?));
        }

        let mut moved = 0;
        for (id, position) in moves {
            let node = self
                .nodes
                .get_mut(&id)
                .ok_or(SimError::NodeNotFound(id))?;
            if node.position.equals(&position)? {
                continue;
            }
            self.index.reposition(id, position.point()?);
            node.position = position;
            moved += 1;
        }
        debug!("Moved {} nodes", moved);
        Ok(())
    }

    /// Re-evaluates the outgoing edges of every node.
    ///
    /// Each node starts with all of its edges marked as deprecated. Every candidate the
    /// connectivity model accepts keeps or creates its edge, every candidate it rejects loses its
    /// edge. Whatever is still deprecated after the scan was not a candidate anymore and is
    /// removed as well. Edges are directed; the reverse edge is never inferred.
    pub(super) fn reevaluate_connections(&mut self) -> SimResult<()> {
        let positions: IndexMap<NodeId, Position> = self
            .nodes
            .iter()
            .map(|(id, node)| node.position.copy().map(|position| (*id, position)))
            .collect::<SimResult<_>>()?;
        let prune = self.project.connection_radius().is_some();
        let mut added = 0;
        let mut removed = 0;

        for (id, own_position) in positions.iter() {
            let candidates: Vec<NodeId> = if prune {
                self.index.possible_neighbors(id)
            } else {
                positions.keys().copied().collect()
            };
            let node = self
                .nodes
                .get_mut(id)
                .ok_or(SimError::NodeNotFound(*id))?;
            let mut deprecated: IndexSet<NodeId> = node.outgoing.keys().copied().collect();
            let own = NodeView::new(*id, own_position);

            for candidate in candidates {
                if candidate == *id {
                    continue;
                }
                let Some(candidate_position) = positions.get(&candidate) else {
                    continue;
                };
                let other = NodeView::new(candidate, candidate_position);
                let connected = node.models.connectivity.is_connected(own, other)?;
                let exists = node.outgoing.contains_key(&candidate);
                match (connected, exists) {
                    (true, false) => {
                        self.edge_serial += 1;
                        node.outgoing
                            .insert(candidate, Edge::new(*id, candidate, self.edge_serial));
                        node.neighborhood_changed = true;
                        added += 1;
                    }
                    (true, true) => {
                        deprecated.shift_remove(&candidate);
                    }
                    (false, true) => {
                        deprecated.shift_remove(&candidate);
                        if let Some(edge) = node.outgoing.shift_remove(&candidate) {
                            invalidate_edge(&mut self.packets, &edge);
                        }
                        node.neighborhood_changed = true;
                        removed += 1;
                    }
                    (false, false) => {}
                }
            }

            for stale in deprecated {
                if let Some(edge) = node.outgoing.shift_remove(&stale) {
                    invalidate_edge(&mut self.packets, &edge);
                    node.neighborhood_changed = true;
                    removed += 1;
                }
            }
        }
        debug!("Connectivity update added {} and removed {} edges", added, removed);
        Ok(())
    }

    /// Re-evaluates connectivity outside the round cycle. Asynchronous hosts call this when
    /// they want the graph to reflect the current positions.
    pub fn refresh_connectivity(&mut self) -> SimResult<()> {
        self.ensure_running()?;
        self.reevaluate_connections()
    }

    /// Takes a node out of the simulation together with everything that refers to it: its
    /// queued events, the edges to and from it and the packets buffered for it. Packets it
    /// originated that are still travelling are denied.
    pub fn remove_node(&mut self, id: NodeId) -> SimResult<()> {
        self.ensure_running()?;
        if !self.nodes.contains_key(&id) {
            return Err(SimError::NodeNotFound(id));
        }
        let dropped_events = self
            .events
            .remove_all_events_for_this_node(id, &mut self.packets, &mut self.nodes)?;

        for node in self.nodes.values_mut() {
            if let Some(edge) = node.outgoing.shift_remove(&id) {
                invalidate_edge(&mut self.packets, &edge);
                node.neighborhood_changed = true;
            }
        }
        let mut node = self
            .nodes
            .shift_remove(&id)
            .ok_or(SimError::NodeNotFound(id))?;
        for edge in node.outgoing.values() {
            invalidate_edge(&mut self.packets, edge);
        }
        for packet in node.inbox_buffer.take_all() {
            if self.packets.remove(&packet).is_some() {
                self.statistics.register_dropped_message();
            }
        }
        for _ in node.nack_box.drain(..) {
            self.statistics.register_dropped_message();
        }
        self.air.forget_missing(&self.packets);
        self.index.remove(&id);
        debug!("Removed node {} and {} of its events", id, dropped_events);
        Ok(())
    }
}

/// Denies delivery of the packets still travelling on a removed edge and detaches them, so
/// their arrival does not release a count on a later edge between the same nodes.
fn invalidate_edge(packets: &mut PacketArena, edge: &Edge) {
    let invalidated = packets.invalidate_edge(&edge.to_ref());
    trace!("Removed edge {} with {} packets in flight", edge.id(), invalidated);
}
