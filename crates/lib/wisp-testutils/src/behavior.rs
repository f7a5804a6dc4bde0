use wisp_core::behavior::{NodeBehavior, NodeContext};
use wisp_core::error::{SimError, SimResult};
use wisp_core::inbox::Inbox;
use wisp_core::message::{Message, TimerData};
use wisp_core::node::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ping(pub u32);

impl Message for Ping {
    fn byte_size(&self) -> usize {
        4
    }
}

/// What a [`Recorder`] saw, in the order it saw it.
#[derive(Clone, Debug, PartialEq)]
pub enum Seen {
    Init,
    PreStep(u64),
    NeighborhoodChange(u64),
    Timer(u64, String),
    Message { round: u64, from: NodeId, ping: u32 },
    Nack { round: u64, to: NodeId, ping: u32 },
    PostStep(u64),
}

/// Records every callback and optionally sends a scripted list of pings.
#[derive(Debug, Default)]
pub struct Recorder {
    pub seen: Vec<Seen>,
    /// `(round, target, ping)`: sent in `pre_step` of the given round.
    pub script: Vec<(u64, NodeId, u32)>,
    /// Broadcast a ping in `pre_step` of these rounds.
    pub broadcasts: Vec<(u64, u32)>,
    /// Timers set in `init`: `(delay, label)`.
    pub timers: Vec<(f64, &'static str)>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sending(mut self, round: u64, target: u64, ping: u32) -> Self {
        self.script.push((round, NodeId::from(target), ping));
        self
    }

    pub fn broadcasting(mut self, round: u64, ping: u32) -> Self {
        self.broadcasts.push((round, ping));
        self
    }

    pub fn with_timer(mut self, delay: f64, label: &'static str) -> Self {
        self.timers.push((delay, label));
        self
    }

    pub fn received(&self) -> Vec<(u64, NodeId, u32)> {
        self.seen
            .iter()
            .filter_map(|seen| match seen {
                Seen::Message { round, from, ping } => Some((*round, *from, *ping)),
                _ => None,
            })
            .collect()
    }

    pub fn nacks(&self) -> Vec<(u64, NodeId, u32)> {
        self.seen
            .iter()
            .filter_map(|seen| match seen {
                Seen::Nack { round, to, ping } => Some((*round, *to, *ping)),
                _ => None,
            })
            .collect()
    }

    pub fn neighborhood_changes(&self) -> usize {
        self.seen
            .iter()
            .filter(|seen| matches!(seen, Seen::NeighborhoodChange(_)))
            .count()
    }
}

impl NodeBehavior for Recorder {
    fn init(&mut self, ctx: &mut NodeContext) -> SimResult<()> {
        self.seen.push(Seen::Init);
        for (delay, label) in self.timers.iter() {
            ctx.set_timer(*delay, label.to_string())?;
        }
        Ok(())
    }

    fn pre_step(&mut self, ctx: &mut NodeContext) -> SimResult<()> {
        let round = ctx.now().as_round();
        self.seen.push(Seen::PreStep(round));
        for (at, target, ping) in self.script.iter() {
            if *at == round {
                ctx.send(*target, Ping(*ping));
            }
        }
        for (at, ping) in self.broadcasts.iter() {
            if *at == round {
                ctx.broadcast(Ping(*ping));
            }
        }
        Ok(())
    }

    fn neighborhood_change(&mut self, ctx: &mut NodeContext) -> SimResult<()> {
        self.seen.push(Seen::NeighborhoodChange(ctx.now().as_round()));
        Ok(())
    }

    fn on_timer(&mut self, ctx: &mut NodeContext, data: Box<dyn TimerData>) -> SimResult<()> {
        let label = data
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        self.seen.push(Seen::Timer(ctx.now().as_round(), label));
        Ok(())
    }

    fn handle_messages(&mut self, ctx: &mut NodeContext, inbox: Inbox) -> SimResult<()> {
        let round = ctx.now().as_round();
        for (packet, ping) in inbox.messages_of::<Ping>() {
            self.seen.push(Seen::Message {
                round,
                from: packet.origin(),
                ping: ping.0,
            });
        }
        Ok(())
    }

    fn handle_nack_messages(&mut self, ctx: &mut NodeContext, nacks: Inbox) -> SimResult<()> {
        let round = ctx.now().as_round();
        for (packet, ping) in nacks.messages_of::<Ping>() {
            self.seen.push(Seen::Nack {
                round,
                to: packet.destination(),
                ping: ping.0,
            });
        }
        Ok(())
    }

    fn post_step(&mut self, ctx: &mut NodeContext) -> SimResult<()> {
        self.seen.push(Seen::PostStep(ctx.now().as_round()));
        Ok(())
    }
}

/// Answers every ping with the next number. The opener sends the first ping in its first
/// `pre_step`.
#[derive(Debug, Default)]
pub struct PingPong {
    pub partner: NodeId,
    pub opens: bool,
    pub arrivals: Vec<(u64, u32)>,
    opened: bool,
}

impl PingPong {
    pub fn new(partner: u64, opens: bool) -> Self {
        Self {
            partner: NodeId::from(partner),
            opens,
            ..Default::default()
        }
    }
}

impl NodeBehavior for PingPong {
    fn pre_step(&mut self, ctx: &mut NodeContext) -> SimResult<()> {
        if self.opens && !self.opened {
            self.opened = true;
            ctx.send(self.partner, Ping(0));
        }
        Ok(())
    }

    fn handle_messages(&mut self, ctx: &mut NodeContext, inbox: Inbox) -> SimResult<()> {
        let round = ctx.now().as_round();
        for packet in inbox {
            if let Some(ping) = packet.message().downcast_ref::<Ping>() {
                self.arrivals.push((round, ping.0));
                ctx.send(packet.origin(), Ping(ping.0 + 1));
            }
        }
        Ok(())
    }
}

/// Returns an error from `handle_messages` in the given round.
#[derive(Debug, Clone, Copy)]
pub struct FailsIn(pub u64);

impl NodeBehavior for FailsIn {
    fn handle_messages(&mut self, ctx: &mut NodeContext, _inbox: Inbox) -> SimResult<()> {
        if ctx.now().as_round() == self.0 {
            return Err(SimError::config("behavior", "failed on purpose"));
        }
        Ok(())
    }
}

/// Returns an error from `init`.
#[derive(Debug, Clone, Copy)]
pub struct FailsOnInit;

impl NodeBehavior for FailsOnInit {
    fn init(&mut self, _ctx: &mut NodeContext) -> SimResult<()> {
        Err(SimError::config("init", "failed on purpose"))
    }

    fn handle_messages(&mut self, _ctx: &mut NodeContext, _inbox: Inbox) -> SimResult<()> {
        Ok(())
    }
}
