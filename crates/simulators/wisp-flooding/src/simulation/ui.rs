use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph};
use ratatui::Frame;

use wisp_output::ui::{Renderer, SimContent};

#[derive(Debug, Default)]
pub struct FloodRenderer {}

impl FloodRenderer {
    pub fn new() -> Self {
        Self {}
    }
}

impl Renderer for FloodRenderer {
    fn render_sim_ui(&self, content: &mut SimContent, frame: &mut Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![
                Constraint::Percentage(25),
                Constraint::Percentage(20),
                Constraint::Percentage(55),
            ])
            .split(frame.area());

        frame.render_widget(
            Paragraph::new(format!(
                " ======================== W I S P ========================\n\
              \n\
              Project: {}\n\
              \n\
              [p] pause / resume    [q] quit\n\
              =============================================================",
                content.metadata.project
            ))
            .block(
                Block::bordered()
                    .title("wisp")
                    .title_alignment(Alignment::Center)
                    .border_type(BorderType::Rounded),
            )
            .style(Style::default().fg(Color::Cyan).bg(Color::Black))
            .centered(),
            layout[0],
        );

        let progress_text = format!(
            "Round {} / {} ({:.2}%) {}",
            content.summary.round,
            content.total_rounds,
            content.completion() * 100.0,
            content.status(),
        );
        frame.render_widget(
            Gauge::default()
                .gauge_style(
                    Style::default()
                        .fg(Color::LightBlue)
                        .bg(Color::Black)
                        .add_modifier(Modifier::ITALIC),
                )
                .label(progress_text)
                .ratio(content.completion())
                .use_unicode(true)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Simulation Progress")
                        .title_alignment(Alignment::Center),
                ),
            layout[1],
        );

        let summary = &content.summary;
        let simulation_details = format!(
            "Input File: {}\n\
             Output Path: {}\n\
             Log Path: {}\n\
             Nodes: {}\n\
             Edges: {}\n\
             Sent: {}\n\
             Received: {}\n\
             Dropped: {}\n\
             In flight: {}",
            content.metadata.input_file,
            content.metadata.output_path,
            content.metadata.log_path,
            summary.nodes,
            summary.edges,
            summary.sent_messages,
            summary.received_messages,
            summary.dropped_messages,
            summary.packets_in_flight,
        );
        frame.render_widget(
            Paragraph::new(simulation_details)
                .block(Block::default().borders(Borders::ALL).title("More details"))
                .style(Style::default().fg(Color::White).bg(Color::Black))
                .alignment(Alignment::Left),
            layout[2],
        );
    }
}
