use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::time::Duration;
use std::{io, thread};

use crossterm::event::{self, Event as CrosstermEvent};
use log::{error, info};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use thiserror::Error;

use wisp_core::control::{RoundDriver, RunControl, RunState};
use wisp_core::error::SimError;
use wisp_core::simulation::Simulation;
use wisp_output::error::OutputError;
use wisp_output::result::Results;
use wisp_output::terminal::{handle_sim_key_events, TerminalUI};
use wisp_output::ui::{Message, Renderer, SimContent, SimUIMetadata};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Simulation(#[from] SimError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

/// Writes the output tables of each round. The first output error stops the run.
struct Recording<'a> {
    results: Option<&'a mut Results>,
    control: RunControl,
    failure: Option<OutputError>,
}

impl Recording<'_> {
    fn record(&mut self, sim: &Simulation) {
        let Some(results) = self.results.as_deref_mut() else {
            return;
        };
        if self.failure.is_some() {
            return;
        }
        if let Err(e) = results.record(sim) {
            error!("Writing results failed: {}", e);
            self.failure = Some(e);
            self.control.stop();
        }
    }

    fn finish(self) -> Result<(), RunError> {
        match self.failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

fn close(results: Option<Results>) -> Result<(), RunError> {
    if let Some(results) = results {
        results.close_files()?;
    }
    Ok(())
}

/// Runs without a terminal UI. The simulation is finished and the results are closed in
/// every outcome.
pub fn run_headless(
    sim: &mut Simulation,
    mut driver: RoundDriver,
    rounds: u64,
    mut results: Option<Results>,
) -> Result<RunState, RunError> {
    let mut recording = Recording {
        control: driver.control().clone(),
        results: results.as_mut(),
        failure: None,
    };
    let outcome = driver.run_recorded(
        sim,
        rounds,
        |sim| recording.record(sim),
        |summary| info!("Round {}: {} edges", summary.round, summary.edges),
        |sim| info!("Interrupted in round {}", sim.now().as_round()),
    );
    let recorded = recording.finish();
    sim.finish();
    close(results)?;
    recorded?;
    Ok(outcome?)
}

/// Runs the simulation on the calling thread while a terminal UI renders the summaries on
/// another. Key presses reach the driver through its [`RunControl`].
pub fn run_simulation<R: Renderer>(
    sim: &mut Simulation,
    mut driver: RoundDriver,
    rounds: u64,
    mut results: Option<Results>,
    metadata: SimUIMetadata,
    renderer: R,
) -> Result<RunState, RunError> {
    let (sender_ui, receiver_ui) = mpsc::sync_channel(0);
    let poll_sender = sender_ui.clone();
    let control = driver.control().clone();
    let ui_control = control.clone();
    let finished = AtomicBool::new(false);
    let poller_finished = &finished;

    let (outcome, recorded, ui) = thread::scope(|s| {
        let ui = s.spawn(move || {
            add_event_listener(receiver_ui, rounds, metadata, renderer, ui_control)
        });
        s.spawn(move || add_event_poller(&poll_sender, poller_finished));

        let mut recording = Recording {
            control: control.clone(),
            results: results.as_mut(),
            failure: None,
        };
        let outcome = driver.run_recorded(
            sim,
            rounds,
            |sim| recording.record(sim),
            |summary| {
                let _ = sender_ui.send(Message::Summary(*summary));
            },
            |sim| info!("Interrupted in round {}", sim.now().as_round()),
        );
        let _ = sender_ui.send(Message::State(driver.state()));
        finished.store(true, Ordering::Relaxed);
        let _ = sender_ui.send(Message::Quit);
        drop(sender_ui);
        let ui = ui
            .join()
            .unwrap_or_else(|_| Err(RunError::Terminal("UI thread panicked".to_string())));
        (outcome, recording.finish(), ui)
    });

    sim.finish();
    close(results)?;
    ui?;
    recorded?;
    Ok(outcome?)
}

pub fn add_event_listener<R: Renderer>(
    receiver_ui: Receiver<Message>,
    rounds: u64,
    metadata: SimUIMetadata,
    renderer: R,
    control: RunControl,
) -> Result<(), RunError> {
    let mut ui_content = SimContent::new(rounds, metadata);
    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend).map_err(|e| RunError::Terminal(e.to_string()))?;
    let mut tui = TerminalUI::new(terminal, renderer);
    tui.init().map_err(|e| RunError::Terminal(e.to_string()))?;

    while ui_content.running {
        if let Err(e) = tui.draw_ui(&mut ui_content) {
            error!("Drawing the terminal failed: {}", e);
            control.stop();
            break;
        }
        match receiver_ui.recv() {
            Ok(message) => match message {
                Message::Summary(summary) => ui_content.update_summary(summary),
                Message::State(state) => ui_content.update_state(state),
                Message::Quit => ui_content.quit(),
                Message::Key(key_event) => {
                    handle_sim_key_events(key_event, &mut ui_content, &control)
                }
                Message::Mouse(_) => {}
                Message::Resize(_, _) => {}
            },
            Err(_) => break,
        }
    }
    tui.exit().map_err(|e| RunError::Terminal(e.to_string()))
}

/// Forwards terminal events until the run has finished or the UI is gone.
pub fn add_event_poller(sender: &SyncSender<Message>, finished: &AtomicBool) {
    while !finished.load(Ordering::Relaxed) {
        let message = match event::poll(POLL_INTERVAL) {
            Ok(true) => match event::read() {
                Ok(CrosstermEvent::Key(e)) => Some(Message::Key(e)),
                Ok(CrosstermEvent::Mouse(e)) => Some(Message::Mouse(e)),
                Ok(CrosstermEvent::Resize(w, h)) => Some(Message::Resize(w, h)),
                Ok(_) => None,
                Err(e) => {
                    error!("Reading terminal events failed: {}", e);
                    return;
                }
            },
            Ok(false) => None,
            Err(e) => {
                error!("Polling terminal events failed: {}", e);
                return;
            }
        };
        if let Some(message) = message {
            if sender.send(message).is_err() {
                return;
            }
        }
    }
}
