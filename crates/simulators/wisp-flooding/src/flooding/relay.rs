use hashbrown::HashMap;
use log::trace;

use wisp_core::behavior::{NodeBehavior, NodeContext};
use wisp_core::error::SimResult;
use wisp_core::inbox::Inbox;

use crate::flooding::message::Flood;

/// What the source node floods and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodSource {
    pub interval: u64,
    pub floods: u32,
    pub payload_size: usize,
}

/// When and over how many hops a flood reached this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reception {
    pub round: u64,
    pub hops: u32,
}

/// Rebroadcasts every flood it sees for the first time. The source additionally starts a new
/// flood in the first round and every `interval` rounds after it.
#[derive(Debug, Default)]
pub struct Relay {
    source: Option<FloodSource>,
    issued: u32,
    seen: HashMap<u32, Reception>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(source: FloodSource) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    pub fn is_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn issued(&self) -> u32 {
        self.issued
    }

    pub fn has_seen(&self, seq: u32) -> bool {
        self.seen.contains_key(&seq)
    }

    pub fn reception(&self, seq: u32) -> Option<Reception> {
        self.seen.get(&seq).copied()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

impl NodeBehavior for Relay {
    fn pre_step(&mut self, ctx: &mut NodeContext) -> SimResult<()> {
        let Some(source) = self.source else {
            return Ok(());
        };
        let round = ctx.now().as_round();
        if self.issued >= source.floods || round.saturating_sub(1) % source.interval.max(1) != 0 {
            return Ok(());
        }
        let flood = Flood {
            seq: self.issued,
            origin: ctx.id(),
            hops: 0,
            payload_size: source.payload_size,
        };
        self.seen.insert(flood.seq, Reception { round, hops: 0 });
        self.issued += 1;
        trace!("Node {} starts flood {}", ctx.id(), flood.seq);
        ctx.broadcast(flood);
        Ok(())
    }

    fn handle_messages(&mut self, ctx: &mut NodeContext, inbox: Inbox) -> SimResult<()> {
        let round = ctx.now().as_round();
        for (_, flood) in inbox.messages_of::<Flood>() {
            if self.seen.contains_key(&flood.seq) {
                continue;
            }
            let relayed = flood.relayed();
            self.seen.insert(
                flood.seq,
                Reception {
                    round,
                    hops: relayed.hops,
                },
            );
            ctx.broadcast(relayed);
        }
        Ok(())
    }
}
