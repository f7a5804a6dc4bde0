use log::trace;

use crate::behavior::{Outgoing, Target, TimerRequest};
use crate::edge::Edge;
use crate::error::{SimError, SimResult};
use crate::event::EventKind;
use crate::message::{Message, TransmissionType};
use crate::node::NodeId;
use crate::packet::Packet;
use crate::simulation::Simulation;
use crate::timer::{Timer, TimerId, TimerOwner};

impl Simulation {
    pub(super) fn dispatch(&mut self, origin: NodeId, outgoing: Outgoing) -> SimResult<()> {
        match outgoing.target {
            Target::Node(target) => self.send_packet(
                origin,
                target,
                outgoing.message,
                outgoing.intensity,
                TransmissionType::Unicast,
            ),
            Target::Neighbors => {
                let targets: Vec<NodeId> = self.node(&origin)?.neighbors().collect();
                for target in targets {
                    self.send_packet(
                        origin,
                        target,
                        outgoing.message.clone(),
                        outgoing.intensity,
                        TransmissionType::Broadcast,
                    )?;
                }
                Ok(())
            }
        }
    }

    /// Wraps a message into a packet and puts it on its way.
    ///
    /// A packet to a neighbor travels on the edge and may be denied by the sender's reliability
    /// model. A packet to any other node is denied at once and only ever comes back as a NACK.
    fn send_packet(
        &mut self,
        origin: NodeId,
        target: NodeId,
        message: Box<dyn Message>,
        intensity: f64,
        transmission: TransmissionType,
    ) -> SimResult<()> {
        let now = self.now;
        let source = self
            .nodes
            .get(&origin)
            .ok_or(SimError::NodeNotFound(origin))?;
        let destination = self
            .nodes
            .get(&target)
            .ok_or(SimError::NodeNotFound(target))?;
        let delay = self
            .transmission
            .time_to_reach(source.view(), destination.view(), message.as_ref())?;
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(SimError::OutOfBounds {
                field: format!("{}.time_to_reach", self.project.message_transmission.model),
                value: delay,
                min: 0.0,
                max: f64::MAX,
            });
        }
        let edge = source.edge_to(&target).map(Edge::to_ref);

        let mut packet = Packet::builder()
            .id(self.packets.next_id())
            .message(message)
            .origin(origin)
            .destination(target)
            .transmission(transmission)
            .edge(edge)
            .sending_time(now)
            .arriving_time(now + delay)
            .intensity(intensity)
            .header_size(self.project.packet_header_size)
            .build();
        self.statistics.register_sent_message(&packet);

        let sender = self
            .nodes
            .get_mut(&origin)
            .ok_or(SimError::NodeNotFound(origin))?;
        match sender.outgoing.get_mut(&target) {
            Some(edge) => {
                if !sender.models.reliability.reaches_destination(&packet)? {
                    packet.deny_delivery();
                }
                edge.add_packet(&packet)?;
            }
            None => packet.deny_delivery(),
        }
        trace!(
            "Node {} sent packet {} to {} arriving at {}",
            origin,
            packet.id(),
            target,
            packet.arriving_time
        );

        let id = packet.id();
        let arriving_time = packet.arriving_time;
        let on_edge = edge.is_some();
        if !on_edge && !self.project.nack_enabled {
            self.statistics.register_dropped_message();
            return Ok(());
        }
        self.packets.insert(packet);
        if on_edge && self.project.interference_enabled {
            self.air.add(id, &mut self.packets, &self.nodes)?;
        }

        if self.project.asynchronous {
            let kind = if on_edge {
                EventKind::Packet {
                    packet: id,
                    origin,
                    destination: target,
                }
            } else {
                EventKind::Nack {
                    packet: id,
                    origin,
                    destination: target,
                }
            };
            self.events.enqueue(arriving_time, kind);
            return Ok(());
        }
        let holder = if on_edge { target } else { origin };
        self.nodes
            .get_mut(&holder)
            .ok_or(SimError::NodeNotFound(holder))?
            .inbox_buffer
            .add(arriving_time, id);
        Ok(())
    }

    pub(super) fn schedule_node_timers(
        &mut self,
        node: NodeId,
        timers: Vec<TimerRequest>,
    ) -> SimResult<()> {
        for request in timers {
            let timer = self.timer(TimerOwner::Node(node), request);
            if self.project.asynchronous {
                self.events.enqueue(timer.fire_time, EventKind::Timer(timer));
            } else {
                self.nodes
                    .get_mut(&node)
                    .ok_or(SimError::NodeNotFound(node))?
                    .timers
                    .insert(timer);
            }
        }
        Ok(())
    }

    pub(super) fn schedule_global_timers(&mut self, timers: Vec<TimerRequest>) {
        for request in timers {
            let timer = self.timer(TimerOwner::Global, request);
            if self.project.asynchronous {
                self.events.enqueue(timer.fire_time, EventKind::Timer(timer));
            } else {
                self.global_timers.insert(timer);
            }
        }
    }

    fn timer(&mut self, owner: TimerOwner, request: TimerRequest) -> Timer {
        let id = TimerId::from(self.timer_serial);
        self.timer_serial += 1;
        Timer {
            id,
            fire_time: self.now + request.delay,
            owner,
            data: request.data,
        }
    }
}
