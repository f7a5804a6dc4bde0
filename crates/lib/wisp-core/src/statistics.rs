use std::collections::BTreeMap;

use log::trace;

use crate::packet::Packet;

/// Message, byte and payload byte counts in one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub messages: u64,
    pub bytes: u64,
    pub message_bytes: u64,
}

impl Counters {
    fn register(&mut self, packet: &Packet) {
        self.messages += 1;
        self.bytes += packet.byte_size() as u64;
        self.message_bytes += packet.message_size() as u64;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundStatistics {
    pub round: u64,
    pub sent: Counters,
    pub received: Counters,
}

impl RoundStatistics {
    pub fn new(round: u64) -> Self {
        Self {
            round,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Running {
    sent: Counters,
    received: Counters,
    last_round_sent: Counters,
    last_round_received: Counters,
    last_sent_round: Option<u64>,
    last_received_round: Option<u64>,
    dropped: u64,
}

#[derive(Debug, Clone, Default)]
struct Checkpoint {
    running: Running,
    touched: BTreeMap<u64, Option<RoundStatistics>>,
}

/// Running totals of sent and received messages, the counters of the last round seen in each
/// direction and, if retained, the full per-round history.
///
/// The last-round counters of a direction are reset by the first registration that carries a
/// new round, so they never mix two rounds.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    keep_rounds: bool,
    running: Running,
    rounds: BTreeMap<u64, RoundStatistics>,
    checkpoint: Option<Checkpoint>,
}

impl Statistics {
    pub fn new(keep_rounds: bool) -> Self {
        Self {
            keep_rounds,
            ..Default::default()
        }
    }

    pub fn register_sent_message(&mut self, packet: &Packet) {
        let round = packet.sending_time.as_round();
        let running = &mut self.running;
        if running.last_sent_round != Some(round) {
            running.last_round_sent = Counters::default();
            running.last_sent_round = Some(round);
        }
        running.sent.register(packet);
        running.last_round_sent.register(packet);
        if self.keep_rounds {
            self.round_entry(round).sent.register(packet);
        }
        trace!("Registered packet {} as sent in round {}", packet.id(), round);
    }

    /// Counts a delivered packet. Packets whose delivery was denied are never counted; the
    /// return value tells whether the packet was registered.
    pub fn register_received_message(&mut self, packet: &Packet) -> bool {
        if !packet.positive_delivery() {
            return false;
        }
        let round = packet.arriving_time.as_round();
        let running = &mut self.running;
        if running.last_received_round != Some(round) {
            running.last_round_received = Counters::default();
            running.last_received_round = Some(round);
        }
        running.received.register(packet);
        running.last_round_received.register(packet);
        if self.keep_rounds {
            self.round_entry(round).received.register(packet);
        }
        trace!("Registered packet {} as received in round {}", packet.id(), round);
        true
    }

    pub fn register_dropped_message(&mut self) {
        self.running.dropped += 1;
    }

    /// Starts recording changes so that they can be undone with [`Statistics::rollback`].
    pub fn checkpoint(&mut self) {
        self.checkpoint = Some(Checkpoint {
            running: self.running,
            touched: BTreeMap::new(),
        });
    }

    pub fn commit(&mut self) {
        self.checkpoint = None;
    }

    /// Restores the state of the last checkpoint.
    pub fn rollback(&mut self) {
        let Some(checkpoint) = self.checkpoint.take() else {
            return;
        };
        self.running = checkpoint.running;
        for (round, previous) in checkpoint.touched {
            match previous {
                Some(previous) => {
                    self.rounds.insert(round, previous);
                }
                None => {
                    self.rounds.remove(&round);
                }
            }
        }
    }

    fn round_entry(&mut self, round: u64) -> &mut RoundStatistics {
        if let Some(checkpoint) = self.checkpoint.as_mut() {
            checkpoint
                .touched
                .entry(round)
                .or_insert_with(|| self.rounds.get(&round).cloned());
        }
        self.rounds
            .entry(round)
            .or_insert_with(|| RoundStatistics::new(round))
    }

    pub fn sent(&self) -> &Counters {
        &self.running.sent
    }

    pub fn received(&self) -> &Counters {
        &self.running.received
    }

    pub fn sent_messages(&self) -> u64 {
        self.running.sent.messages
    }

    pub fn received_messages(&self) -> u64 {
        self.running.received.messages
    }

    pub fn sent_bytes(&self) -> u64 {
        self.running.sent.bytes
    }

    pub fn received_bytes(&self) -> u64 {
        self.running.received.bytes
    }

    pub fn sent_message_bytes(&self) -> u64 {
        self.running.sent.message_bytes
    }

    pub fn received_message_bytes(&self) -> u64 {
        self.running.received.message_bytes
    }

    pub fn dropped_messages(&self) -> u64 {
        self.running.dropped
    }

    pub fn last_round_sent(&self) -> &Counters {
        &self.running.last_round_sent
    }

    pub fn last_round_received(&self) -> &Counters {
        &self.running.last_round_received
    }

    pub fn last_round_sent_messages(&self) -> u64 {
        self.running.last_round_sent.messages
    }

    pub fn last_round_received_messages(&self) -> u64 {
        self.running.last_round_received.messages
    }

    pub fn keeps_rounds(&self) -> bool {
        self.keep_rounds
    }

    pub fn round(&self, round: u64) -> Option<&RoundStatistics> {
        self.rounds.get(&round)
    }

    pub fn rounds(&self) -> impl Iterator<Item = &RoundStatistics> {
        self.rounds.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::SizedMessage;
    use crate::node::NodeId;
    use crate::packet::PacketId;
    use crate::time::SimTime;

    fn sent_in(round: u64) -> Packet {
        Packet::builder()
            .id(PacketId::from(round))
            .message(Box::new(SizedMessage(10)))
            .origin(NodeId::from(0))
            .destination(NodeId::from(1))
            .sending_time(SimTime::from(round))
            .arriving_time(SimTime::from(round + 1))
            .header_size(4)
            .build()
    }

    #[test]
    fn rollback_restores_counters_and_history() {
        let mut statistics = Statistics::new(true);
        statistics.register_sent_message(&sent_in(1));
        statistics.checkpoint();
        statistics.register_sent_message(&sent_in(1));
        statistics.register_sent_message(&sent_in(2));
        statistics.register_received_message(&sent_in(1));
        assert_eq!(statistics.sent_messages(), 3);
        statistics.rollback();

        assert_eq!(statistics.sent_messages(), 1);
        assert_eq!(statistics.sent_bytes(), 14);
        assert_eq!(statistics.received_messages(), 0);
        assert_eq!(statistics.last_round_sent_messages(), 1);
        assert_eq!(statistics.round(1).map(|round| round.sent.messages), Some(1));
        assert!(statistics.round(2).is_none());
    }
}
