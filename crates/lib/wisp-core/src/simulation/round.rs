use log::{debug, error, trace};

use crate::behavior::NodeContext;
use crate::error::{SimError, SimResult};
use crate::inbox::Inbox;
use crate::node::{release_edge_of, NodeId};
use crate::packet::Packet;
use crate::simulation::Simulation;
use crate::time::SimTime;

impl Simulation {
    /// Runs one synchronous round.
    ///
    /// An error aborts the run: time, positions, graph, packets, buffers, timers and statistics
    /// fall back to the last completed round and every later call fails with
    /// [`SimError::Aborted`].
    pub fn run_round(&mut self) -> SimResult<()> {
        self.ensure_running()?;
        if self.project.asynchronous {
            return Err(SimError::config(
                "project.asynchronous",
                "rounds are not available in asynchronous mode",
            ));
        }
        self.initialize()?;

        let checkpoint = self.checkpoint()?;
        let round = self.now.as_round() + 1;
        self.now = SimTime::from(round);
        self.even_round = !self.even_round;
        debug!("Round {} started", round);

        match self.round_body() {
            Ok(()) => {
                self.commit();
                Ok(())
            }
            Err(e) => {
                error!("Round {} aborted: {}", round, e);
                self.restore(checkpoint);
                self.aborted_in = Some(round);
                Err(e)
            }
        }
    }

    /// Advances by one time unit: a round in synchronous mode, the events up to the next
    /// integral time in asynchronous mode.
    pub fn advance(&mut self) -> SimResult<()> {
        if self.project.asynchronous {
            let until = SimTime::from(self.now.as_round() + 1);
            return self.run_until(until).map(|_| ());
        }
        self.run_round()
    }

    fn round_body(&mut self) -> SimResult<()> {
        self.with_hooks(|hooks, ctx| hooks.pre_round(ctx))?;
        self.fire_global_timers()?;
        if self.project.mobility_enabled {
            self.move_nodes()?;
        }
        if self.project.connectivity_enabled {
            self.reevaluate_connections()?;
        }
        if self.project.interference_enabled {
            self.air.test_for_interference(&mut self.packets, &self.nodes)?;
        }
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.step_node(id)?;
        }
        self.with_hooks(|hooks, ctx| hooks.post_round(ctx))?;
        Ok(())
    }

    /// Fires the due global timers one by one in fire time order, each removed before it fires.
    fn fire_global_timers(&mut self) -> SimResult<()> {
        while let Some(timer) = self.global_timers.pop_due(self.now) {
            trace!("Global timer {} fired", timer.id);
            self.with_hooks(|hooks, ctx| hooks.on_global_timer(ctx, timer.data))?;
        }
        Ok(())
    }

    /// Takes the packets that reached the node out of the air, off their edges and into the
    /// node's inbox. Denied packets turn into NACKs for their origin or are dropped.
    fn collect_arrivals(&mut self, id: NodeId) -> SimResult<(Vec<Packet>, Vec<Packet>)> {
        let arrived = self
            .nodes
            .get_mut(&id)
            .ok_or(SimError::NodeNotFound(id))?
            .inbox_buffer
            .take_arrived(self.now);
        let mut delivered = Vec::new();
        let mut nacks = Vec::new();
        for packet_id in arrived {
            self.air.remove(packet_id, &mut self.packets, &self.nodes)?;
            let Some(packet) = self.packets.remove(&packet_id) else {
                continue;
            };
            release_edge_of(&packet, &mut self.nodes)?;
            if packet.destination() == id && self.statistics.register_received_message(&packet)
            {
                delivered.push(packet);
            } else if !self.project.nack_enabled {
                self.statistics.register_dropped_message();
            } else if packet.origin() == id {
                nacks.push(packet);
            } else if let Some(origin) = self.nodes.get_mut(&packet.origin()) {
                origin.nack_box.push(packet);
            } else {
                self.statistics.register_dropped_message();
            }
        }
        Ok((delivered, nacks))
    }

    fn step_node(&mut self, id: NodeId) -> SimResult<()> {
        let (delivered, mut nacks) = self.collect_arrivals(id)?;
        let now = self.now;
        let nack_enabled = self.project.nack_enabled;

        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(SimError::NodeNotFound(id))?;
        let behavior = node.behavior.as_mut();
        let mut ctx = NodeContext::new(id, now, &node.position, &node.outgoing);

        behavior.pre_step(&mut ctx)?;
        if node.neighborhood_changed {
            node.neighborhood_changed = false;
            behavior.neighborhood_change(&mut ctx)?;
        }
        for timer in node.timers.drain_due(now) {
            behavior.on_timer(&mut ctx, timer.data)?;
        }
        if !delivered.is_empty() {
            trace!("Node {} received {} packets", id, delivered.len());
        }
        behavior.handle_messages(&mut ctx, Inbox::new(delivered))?;
        if nack_enabled {
            nacks.append(&mut node.nack_box);
            behavior.handle_nack_messages(&mut ctx, Inbox::new(nacks))?;
        }
        behavior.post_step(&mut ctx)?;

        let (outbox, timers) = ctx.into_parts();
        self.schedule_node_timers(id, timers)?;
        for outgoing in outbox {
            self.dispatch(id, outgoing)?;
        }
        Ok(())
    }
}
