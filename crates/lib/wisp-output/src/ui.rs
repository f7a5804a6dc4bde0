use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::Frame;

use wisp_core::control::RunState;
use wisp_core::simulation::SimulationSummary;

#[derive(Clone, Copy, Debug)]
pub enum Message {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Summary(SimulationSummary),
    State(RunState),
    Quit,
}

#[derive(Debug, Clone, Default)]
pub struct SimUIMetadata {
    pub project: String,
    pub input_file: String,
    pub output_path: String,
    pub log_path: String,
}

#[derive(Debug, Default)]
pub struct SimContent {
    pub running: bool,
    pub paused: bool,
    pub total_rounds: u64,
    pub summary: SimulationSummary,
    pub state: RunState,
    pub metadata: SimUIMetadata,
}

impl SimContent {
    pub fn new(total_rounds: u64, metadata: SimUIMetadata) -> Self {
        Self {
            total_rounds,
            running: true,
            metadata,
            ..Self::default()
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn update_summary(&mut self, summary: SimulationSummary) {
        self.summary = summary;
    }

    pub fn update_state(&mut self, state: RunState) {
        self.state = state;
    }

    pub fn completion(&self) -> f64 {
        if self.total_rounds == 0 {
            return 0.0;
        }
        (self.summary.round as f64 / self.total_rounds as f64).clamp(0.0, 1.0)
    }

    /// The state shown to the user; a running simulation may be paused.
    pub fn status(&self) -> String {
        if self.paused && self.state == RunState::Running {
            "paused".to_string()
        } else {
            self.state.to_string()
        }
    }
}

pub trait Renderer: Send {
    fn render_sim_ui(&self, content: &mut SimContent, frame: &mut Frame);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_clamped() {
        let mut content = SimContent::new(10, SimUIMetadata::default());
        assert_eq!(content.completion(), 0.0);
        content.update_summary(SimulationSummary {
            round: 5,
            ..Default::default()
        });
        assert_eq!(content.completion(), 0.5);
        content.update_summary(SimulationSummary {
            round: 12,
            ..Default::default()
        });
        assert_eq!(content.completion(), 1.0);
        assert_eq!(SimContent::new(0, SimUIMetadata::default()).completion(), 0.0);
    }
}
