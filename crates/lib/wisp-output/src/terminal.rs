use std::panic;
use std::{error, io};

use crossterm::event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::Backend;
use ratatui::Terminal;

use wisp_core::control::RunControl;

use crate::ui::{Renderer, SimContent};

pub type ContentResult<T> = Result<T, Box<dyn error::Error>>;

/// Representation of a terminal user interface.
///
/// It is responsible for setting up the terminal,
/// initializing the interface and handling the draw events.
#[derive(Debug)]
pub struct TerminalUI<B: Backend, R: Renderer> {
    terminal: Terminal<B>,
    renderer: R,
}

impl<B: Backend, R: Renderer> TerminalUI<B, R> {
    pub fn new(terminal: Terminal<B>, renderer: R) -> Self {
        Self { terminal, renderer }
    }

    /// Enables the raw mode and switches to the alternate screen.
    pub fn init(&mut self) -> ContentResult<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;

        // Restore the terminal before the panic message is printed.
        let panic_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic| {
            if let Some(message) = reset_failure(Self::reset()) {
                eprintln!("{}", message);
            }
            panic_hook(panic);
        }));

        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn draw_ui(&mut self, content: &mut SimContent) -> ContentResult<()> {
        self.terminal
            .draw(|frame| self.renderer.render_sim_ui(content, frame))?;
        Ok(())
    }

    fn reset() -> ContentResult<()> {
        terminal::disable_raw_mode()?;
        crossterm::execute!(io::stderr(), LeaveAlternateScreen, DisableMouseCapture)?;
        Ok(())
    }

    /// Disables the raw mode and reverts the terminal properties.
    pub fn exit(&mut self) -> ContentResult<()> {
        Self::reset()?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

/// `q` or escape stops the run, `p` pauses and resumes it.
pub fn handle_sim_key_events(key_event: KeyEvent, content: &mut SimContent, control: &RunControl) {
    match key_event.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            control.stop();
            content.quit();
        }
        KeyCode::Char('p') => {
            control.toggle_pause();
            content.paused = control.is_paused();
        }
        _ => {}
    }
}

fn reset_failure(reset: ContentResult<()>) -> Option<String> {
    reset
        .err()
        .map(|e| format!("Failed to restore the terminal: {}", e))
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::ui::SimUIMetadata;

    #[test]
    fn keys_drive_the_run_control() {
        let control = RunControl::new();
        let mut content = SimContent::new(10, SimUIMetadata::default());
        let key = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);

        handle_sim_key_events(key('p'), &mut content, &control);
        assert!(content.paused && control.is_paused());
        handle_sim_key_events(key('p'), &mut content, &control);
        assert!(!content.paused && !control.is_paused());
        handle_sim_key_events(key('x'), &mut content, &control);
        assert!(content.running);
        handle_sim_key_events(key('q'), &mut content, &control);
        assert!(!content.running && control.is_stopped());
    }

    #[test]
    fn failed_reset_is_reported() {
        assert_eq!(reset_failure(Ok(())), None);
        assert_eq!(
            reset_failure(Err("raw mode unavailable".into())),
            Some("Failed to restore the terminal: raw mode unavailable".to_string())
        );
    }
}
