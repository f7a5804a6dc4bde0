use std::collections::BTreeMap;
use std::fmt;

use crate::message::TimerData;
use crate::node::NodeId;
use crate::time::SimTime;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl From<u64> for TimerId {
    fn from(f: u64) -> Self {
        Self(f)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerOwner {
    Node(NodeId),
    Global,
}

#[derive(Debug, Clone)]
pub struct Timer {
    pub id: TimerId,
    pub fire_time: SimTime,
    pub owner: TimerOwner,
    pub data: Box<dyn TimerData>,
}

/// Timers ordered by fire time, ties broken by the order in which they were set.
#[derive(Debug, Default, Clone)]
pub struct TimerSet {
    timers: BTreeMap<(SimTime, TimerId), Timer>,
}

impl TimerSet {
    pub fn insert(&mut self, timer: Timer) {
        self.timers.insert((timer.fire_time, timer.id), timer);
    }

    /// Removes and returns the earliest timer if it is due at `now`.
    pub fn pop_due(&mut self, now: SimTime) -> Option<Timer> {
        let (fire_time, _) = *self.timers.keys().next()?;
        if fire_time > now {
            return None;
        }
        self.timers.pop_first().map(|(_, timer)| timer)
    }

    /// Removes every timer due at `now`, earliest first.
    pub fn drain_due(&mut self, now: SimTime) -> Vec<Timer> {
        let mut due = Vec::new();
        while let Some(timer) = self.pop_due(now) {
            due.push(timer);
        }
        due
    }

    pub fn next_fire_time(&self) -> Option<SimTime> {
        self.timers.keys().next().map(|(fire_time, _)| *fire_time)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
