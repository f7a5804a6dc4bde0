//! Event-driven execution. Connectivity is evaluated once when the simulation initializes and
//! nodes do not move; time jumps from one event to the next.

use log::{debug, error, trace};

use crate::error::{SimError, SimResult};
use crate::event::{Event, EventKind};
use crate::inbox::Inbox;
use crate::node::{release_edge_of, NodeId};
use crate::packet::PacketId;
use crate::simulation::Simulation;
use crate::time::SimTime;
use crate::timer::TimerOwner;

impl Simulation {
    /// Handles up to `max_events` queued events in time order and returns how many were
    /// handled. An error aborts the run the same way a failed round does.
    pub fn run_events(&mut self, max_events: usize) -> SimResult<usize> {
        self.prepare_events()?;
        let mut handled = 0;
        while handled < max_events && self.handle_next()? {
            handled += 1;
        }
        debug!("Handled {} events, {} still queued", handled, self.events.len());
        Ok(handled)
    }

    /// Handles every event due at or before `until` and moves the clock to `until`.
    pub fn run_until(&mut self, until: SimTime) -> SimResult<usize> {
        self.prepare_events()?;
        let mut handled = 0;
        while self.events.peek().is_some_and(|event| event.time <= until) {
            self.handle_next()?;
            handled += 1;
        }
        if until > self.now {
            self.now = until;
        }
        Ok(handled)
    }

    fn prepare_events(&mut self) -> SimResult<()> {
        self.ensure_running()?;
        if !self.project.asynchronous {
            return Err(SimError::config(
                "project.asynchronous",
                "events are only available in asynchronous mode",
            ));
        }
        self.initialize()
    }

    fn handle_next(&mut self) -> SimResult<bool> {
        let Some(event) = self.events.dequeue() else {
            return Ok(false);
        };
        if event.time > self.now {
            self.now = event.time;
        }
        if let Err(e) = self.handle_event(event) {
            error!("Event handling aborted at {}: {}", self.now, e);
            self.aborted_in = Some(self.now.as_round());
            return Err(e);
        }
        Ok(true)
    }

    fn handle_event(&mut self, event: Event) -> SimResult<()> {
        trace!("Handling event {} at {}", event.id, event.time);
        match event.kind {
            EventKind::Packet {
                packet,
                destination,
                ..
            } => self.deliver_packet(packet, destination),
            EventKind::Nack { packet, origin, .. } => {
                let Some(packet) = self.packets.remove(&packet) else {
                    return Ok(());
                };
                if !self.nodes.contains_key(&origin) {
                    self.statistics.register_dropped_message();
                    return Ok(());
                }
                self.with_behavior(origin, |behavior, ctx| {
                    behavior.handle_nack_messages(ctx, Inbox::new(vec![packet]))
                })
            }
            EventKind::Timer(timer) => match timer.owner {
                TimerOwner::Node(node) => {
                    self.with_behavior(node, |behavior, ctx| behavior.on_timer(ctx, timer.data))
                }
                TimerOwner::Global => {
                    self.with_hooks(|hooks, ctx| hooks.on_global_timer(ctx, timer.data))
                }
            },
        }
    }

    fn deliver_packet(&mut self, id: PacketId, destination: NodeId) -> SimResult<()> {
        self.air.remove(id, &mut self.packets, &self.nodes)?;
        let Some(packet) = self.packets.remove(&id) else {
            return Ok(());
        };
        release_edge_of(&packet, &mut self.nodes)?;
        if self.statistics.register_received_message(&packet) {
            return self.with_behavior(destination, |behavior, ctx| {
                behavior.handle_messages(ctx, Inbox::new(vec![packet]))
            });
        }
        let origin = packet.origin();
        if self.project.nack_enabled && self.nodes.contains_key(&origin) {
            return self.with_behavior(origin, |behavior, ctx| {
                behavior.handle_nack_messages(ctx, Inbox::new(vec![packet]))
            });
        }
        self.statistics.register_dropped_message();
        Ok(())
    }
}
