//! Cooperative control of a running simulation from another thread.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Deserialize;
use typed_builder::TypedBuilder;

use crate::error::{SimError, SimResult};
use crate::simulation::{Simulation, SimulationSummary};

const PAUSE_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Default)]
struct Flags {
    stop: AtomicBool,
    pause: AtomicBool,
}

/// Shared stop and pause switches. Clones refer to the same switches. The driver looks at them
/// between rounds only, so a round always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    flags: Arc<Flags>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flags.stop.store(true, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        self.flags.pause.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.flags.pause.store(false, Ordering::SeqCst);
    }

    pub fn toggle_pause(&self) {
        self.flags.pause.fetch_xor(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.flags.stop.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.flags.pause.load(Ordering::SeqCst)
    }
}

/// How fast the driver goes. `refresh_rate` caps rounds per second, `frame_rate` caps how often
/// the observer sees a summary. Leaving either out means no cap.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, TypedBuilder)]
#[serde(deny_unknown_fields)]
pub struct Pacing {
    #[serde(default)]
    #[builder(default)]
    pub refresh_rate: Option<f64>,
    #[serde(default)]
    #[builder(default)]
    pub frame_rate: Option<f64>,
}

impl Pacing {
    pub fn validate(&self) -> SimResult<()> {
        for (field, rate) in [
            ("pacing.refresh_rate", self.refresh_rate),
            ("pacing.frame_rate", self.frame_rate),
        ] {
            if let Some(rate) = rate {
                if !(rate.is_finite() && rate > 0.0) {
                    return Err(SimError::config(field, "must be a positive number"));
                }
            }
        }
        Ok(())
    }

    fn round_budget(&self) -> Option<Duration> {
        self.refresh_rate.map(|rate| Duration::from_secs_f64(1.0 / rate))
    }

    fn frame_interval(&self) -> Option<Duration> {
        self.frame_rate.map(|rate| Duration::from_secs_f64(1.0 / rate))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Stopped,
    Finished,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Stopped => "stopped",
            RunState::Finished => "finished",
            RunState::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// Runs a simulation round after round until the round limit, the project's termination
/// condition, a stop request or an error.
#[derive(Debug, Clone)]
pub struct RoundDriver {
    control: RunControl,
    pacing: Pacing,
    state: RunState,
}

impl RoundDriver {
    pub fn new(control: RunControl, pacing: Pacing) -> Self {
        Self {
            control,
            pacing,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    /// Runs up to `rounds` rounds (time units in asynchronous mode).
    ///
    /// `observer` gets a summary at most `frame_rate` times per second and always after the
    /// last round. `interrupt` is called once when a stop request ends the run. An error
    /// leaves the driver in [`RunState::Aborted`] and is returned as is.
    pub fn run<O, I>(
        &mut self,
        sim: &mut Simulation,
        rounds: u64,
        observer: O,
        interrupt: I,
    ) -> SimResult<RunState>
    where
        O: FnMut(&SimulationSummary),
        I: FnMut(&Simulation),
    {
        self.run_recorded(sim, rounds, |_| {}, observer, interrupt)
    }

    /// Like [`RoundDriver::run`], with `record` called after every completed round.
    pub fn run_recorded<R, O, I>(
        &mut self,
        sim: &mut Simulation,
        rounds: u64,
        mut record: R,
        mut observer: O,
        mut interrupt: I,
    ) -> SimResult<RunState>
    where
        R: FnMut(&Simulation),
        O: FnMut(&SimulationSummary),
        I: FnMut(&Simulation),
    {
        if let Err(e) = self.pacing.validate() {
            self.state = RunState::Aborted;
            return Err(e);
        }
        self.state = RunState::Running;
        info!("Running {} for up to {} rounds", sim.project().name, rounds);
        let mut last_frame: Option<Instant> = None;

        for _ in 0..rounds {
            self.wait_while_paused();
            if self.control.is_stopped() {
                info!("Stop requested after round {}", sim.now().as_round());
                interrupt(sim);
                self.state = RunState::Stopped;
                return Ok(self.state);
            }

            let started = Instant::now();
            if let Err(e) = sim.advance() {
                warn!("Run aborted: {}", e);
                self.state = RunState::Aborted;
                return Err(e);
            }
            record(sim);

            let frame_due = match (self.pacing.frame_interval(), last_frame) {
                (Some(interval), Some(last)) => last.elapsed() >= interval,
                _ => true,
            };
            if frame_due {
                observer(&sim.summary());
                last_frame = Some(Instant::now());
            }

            if sim.has_terminated() {
                debug!("Termination condition met in round {}", sim.now().as_round());
                break;
            }
            if let Some(budget) = self.pacing.round_budget() {
                let elapsed = started.elapsed();
                if elapsed < budget {
                    thread::sleep(budget - elapsed);
                }
            }
        }

        observer(&sim.summary());
        self.state = RunState::Finished;
        Ok(self.state)
    }

    fn wait_while_paused(&self) {
        if !self.control.is_paused() {
            return;
        }
        debug!("Paused");
        while self.control.is_paused() && !self.control.is_stopped() {
            thread::sleep(PAUSE_POLL);
        }
        debug!("Resumed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_switches() {
        let control = RunControl::new();
        let remote = control.clone();
        remote.pause();
        assert!(control.is_paused());
        control.toggle_pause();
        assert!(!remote.is_paused());
        remote.stop();
        assert!(control.is_stopped());
    }

    #[test]
    fn non_positive_rates_are_rejected() {
        let pacing = Pacing::builder().refresh_rate(Some(0.0)).build();
        assert!(matches!(
            pacing.validate(),
            Err(SimError::Config { field, .. }) if field == "pacing.refresh_rate"
        ));
        assert!(Pacing::default().validate().is_ok());
    }
}
