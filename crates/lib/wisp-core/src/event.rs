//! Event queue of the asynchronous runtime.
//!
//! Events are ordered by time and then by id. Ids grow monotonically, so events at the same
//! time leave the queue in the order they entered it, whatever their kind.

use std::cmp::Ordering;
use std::fmt;

use hashbrown::HashMap;
use keyed_priority_queue::KeyedPriorityQueue;
use log::trace;

use crate::edge::EdgeRef;
use crate::error::SimResult;
use crate::node::{release_edge_of, NodeId, NodeMap};
use crate::packet::{PacketArena, PacketId};
use crate::time::SimTime;
use crate::timer::{Timer, TimerOwner};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub enum EventKind {
    /// A packet arrives at its destination.
    Packet {
        packet: PacketId,
        origin: NodeId,
        destination: NodeId,
    },
    /// An undelivered packet returns to its origin.
    Nack {
        packet: PacketId,
        origin: NodeId,
        destination: NodeId,
    },
    Timer(Timer),
}

#[derive(Debug)]
pub struct Event {
    pub id: EventId,
    pub time: SimTime,
    pub kind: EventKind,
}

impl Event {
    /// The node that handles the event, if any.
    pub fn node(&self) -> Option<NodeId> {
        match &self.kind {
            EventKind::Packet { destination, .. } => Some(*destination),
            EventKind::Nack { origin, .. } => Some(*origin),
            EventKind::Timer(timer) => match timer.owner {
                TimerOwner::Node(node) => Some(node),
                TimerOwner::Global => None,
            },
        }
    }

    pub fn is_node_event(&self) -> bool {
        self.node().is_some()
    }

    pub fn packet(&self) -> Option<PacketId> {
        match &self.kind {
            EventKind::Packet { packet, .. } | EventKind::Nack { packet, .. } => Some(*packet),
            EventKind::Timer(_) => None,
        }
    }

    /// Discards the event without handling it: the packet is released from its edge and
    /// forgotten, a timer simply never fires.
    pub fn drop(self, packets: &mut PacketArena, nodes: &mut NodeMap) -> SimResult<()> {
        if let Some(id) = self.packet() {
            if let Some(packet) = packets.remove(&id) {
                release_edge_of(&packet, nodes)?;
            }
        }
        trace!("Dropped event {} at {}", self.id, self.time);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct EventOrder {
    time: SimTime,
    id: EventId,
}

impl Ord for EventOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for EventOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueChange {
    Enqueued,
    Dequeued,
    Dropped,
}

/// Observer called synchronously on every change of the queue.
pub trait EventQueueListener: Send {
    fn on_change(&mut self, change: QueueChange, event: &Event, queued: usize);
}

#[derive(Default)]
pub struct EventQueue {
    queue: KeyedPriorityQueue<EventId, EventOrder>,
    events: HashMap<EventId, Event>,
    next_id: u64,
    listeners: Vec<Box<dyn EventQueueListener>>,
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("queued", &self.events.len())
            .field("next_id", &self.next_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventQueue {
    pub fn add_listener(&mut self, listener: Box<dyn EventQueueListener>) {
        self.listeners.push(listener);
    }

    pub fn enqueue(&mut self, time: SimTime, kind: EventKind) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        let event = Event { id, time, kind };
        self.queue.push(id, EventOrder { time, id });
        self.notify(QueueChange::Enqueued, &event);
        self.events.insert(id, event);
        id
    }

    pub fn dequeue(&mut self) -> Option<Event> {
        let (id, _) = self.queue.pop()?;
        let event = self.events.remove(&id)?;
        self.notify(QueueChange::Dequeued, &event);
        Some(event)
    }

    pub fn peek(&self) -> Option<&Event> {
        let (id, _) = self.queue.peek()?;
        self.events.get(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops every event handled by `node` and denies delivery of every queued packet the
    /// node originated, even when another node handles the event.
    pub fn remove_all_events_for_this_node(
        &mut self,
        node: NodeId,
        packets: &mut PacketArena,
        nodes: &mut NodeMap,
    ) -> SimResult<usize> {
        for event in self.events.values() {
            if let EventKind::Packet { packet, origin, .. } = &event.kind {
                if *origin == node {
                    if let Some(packet) = packets.get_mut(packet) {
                        packet.deny_delivery();
                    }
                }
            }
        }
        self.drop_where(|event| event.node() == Some(node), packets, nodes)
    }

    /// Denies delivery of the queued packets bound to `edge` and detaches them from it. The
    /// events stay queued and turn into NACKs or drops when handled.
    pub fn invalidate_packet_events_for_this_edge(
        &mut self,
        edge: &EdgeRef,
        packets: &mut PacketArena,
    ) -> usize {
        let mut count = 0;
        for event in self.events.values() {
            let Some(id) = event.packet() else {
                continue;
            };
            if let Some(packet) = packets.get_mut(&id) {
                if packet.edge().as_ref() == Some(edge) {
                    packet.deny_delivery();
                    packet.detach_edge();
                    count += 1;
                }
            }
        }
        count
    }

    /// Drops every event that belongs to a node. Global timers stay queued.
    pub fn prune_all_node_events(
        &mut self,
        packets: &mut PacketArena,
        nodes: &mut NodeMap,
    ) -> SimResult<usize> {
        self.drop_where(Event::is_node_event, packets, nodes)
    }

    /// Drops every event without handling any of them.
    pub fn drop_all_events(
        &mut self,
        packets: &mut PacketArena,
        nodes: &mut NodeMap,
    ) -> SimResult<usize> {
        self.drop_where(|_| true, packets, nodes)
    }

    fn drop_where<F>(
        &mut self,
        predicate: F,
        packets: &mut PacketArena,
        nodes: &mut NodeMap,
    ) -> SimResult<usize>
    where
        F: Fn(&Event) -> bool,
    {
        let mut doomed: Vec<EventId> = self
            .events
            .values()
            .filter(|event| predicate(event))
            .map(|event| event.id)
            .collect();
        doomed.sort_unstable();
        for id in doomed.iter() {
            self.queue.remove(id);
            if let Some(event) = self.events.remove(id) {
                self.notify(QueueChange::Dropped, &event);
                event.drop(packets, nodes)?;
            }
        }
        Ok(doomed.len())
    }

    fn notify(&mut self, change: QueueChange, event: &Event) {
        let queued = self.queue.len();
        for listener in self.listeners.iter_mut() {
            listener.on_change(change, event, queued);
        }
    }
}
