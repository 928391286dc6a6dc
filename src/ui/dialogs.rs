//! Full-screen overlays shown outside a running session.

use crate::app::{App, Button};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use super::centered_rect;

const START_LABEL: &str = "[ Start ]";

/// Renders the welcome screen and returns the start button's region.
///
/// Audio is only opened once the user presses the button, so nothing
/// sounds before an explicit action.
pub fn render_welcome(frame: &mut Frame, app: &App) -> Vec<(Rect, Button)> {
    let area = centered_rect(60, 50, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" keytone ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(4),    // Text
            Constraint::Length(1), // Button
            Constraint::Length(1), // Hint
        ])
        .split(inner);

    let text = vec![
        Line::from(Span::styled(
            "Virtual Piano",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "{} keys mapped to your computer keyboard.",
            app.table().playable_count()
        )),
        Line::from("Play with the keyboard or the mouse, record takes and save them as WAV."),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        chunks[0],
    );

    let width = (START_LABEL.len() as u16).min(chunks[1].width);
    let button = Rect::new(
        chunks[1].x + (chunks[1].width - width) / 2,
        chunks[1].y,
        width,
        1,
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            START_LABEL,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        button,
    );

    frame.render_widget(
        Paragraph::new(Span::styled(
            "Enter/Space or click to start  |  Esc to quit",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center),
        chunks[2],
    );

    vec![(button, Button::Start)]
}

/// Renders the notice shown when audio output is unavailable.
pub fn render_failure(frame: &mut Frame, message: &str) {
    let area = centered_rect(60, 40, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Audio unavailable ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = vec![
        Line::from(Span::styled(
            "This terminal session cannot play audio.",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to exit",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}
