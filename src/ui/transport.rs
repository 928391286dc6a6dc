//! Recording transport bar.
//!
//! Shows the record, stop, save and play buttons along with the recording
//! state and the current status message.

use crate::app::{App, Button};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Width of each transport button in columns.
const BUTTON_WIDTH: u16 = 13;

fn button_label(button: Button) -> &'static str {
    match button {
        Button::Start => " Start ",
        Button::StartRecording => " [F2] REC ",
        Button::StopRecording => " [F3] STOP ",
        Button::Save => " [F4] SAVE ",
        Button::Play => " [F5] PLAY ",
    }
}

fn button_style(button: Button, enabled: bool) -> Style {
    if !enabled {
        return Style::default().fg(Color::DarkGray);
    }
    let color = match button {
        Button::StartRecording => Color::Red,
        Button::StopRecording => Color::Yellow,
        Button::Save => Color::Cyan,
        Button::Play | Button::Start => Color::Green,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Which transport buttons are usable in the current state.
fn enabled_buttons(app: &App) -> [(Button, bool); 4] {
    let (recording, has_take) = match app.session() {
        Some(session) => (
            session.is_recording(),
            session.recorder().latest().is_some(),
        ),
        None => (false, false),
    };
    let running = app.session().is_some();
    [
        (Button::StartRecording, running && !recording),
        (Button::StopRecording, recording),
        (Button::Save, has_take),
        (Button::Play, has_take),
    ]
}

/// Renders the transport bar and returns the regions of enabled buttons.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `area` - The area to render in
/// * `app` - Application state
pub fn render_transport(frame: &mut Frame, area: Rect, app: &App) -> Vec<(Rect, Button)> {
    let block = Block::default()
        .title(" Transport ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BUTTON_WIDTH),
            Constraint::Length(BUTTON_WIDTH),
            Constraint::Length(BUTTON_WIDTH),
            Constraint::Length(BUTTON_WIDTH),
            Constraint::Length(14), // Recording state
            Constraint::Min(10),    // Status
        ])
        .split(inner);

    let mut regions = Vec::new();
    for (i, (button, enabled)) in enabled_buttons(app).into_iter().enumerate() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                button_label(button),
                button_style(button, enabled),
            )),
            chunks[i],
        );
        if enabled {
            regions.push((chunks[i], button));
        }
    }

    let state = match app.session() {
        Some(session) if session.is_recording() => Span::styled(
            "● RECORDING",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        ),
        Some(session) if session.is_playing_back() => Span::styled(
            "▶ PLAYING",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Some(session) => Span::styled(
            format!("{} takes", session.recorder().sessions().len()),
            Style::default().fg(Color::DarkGray),
        ),
        None => Span::raw(""),
    };
    frame.render_widget(Paragraph::new(Line::from(state)), chunks[4]);

    let status_line = if let Some((msg, _)) = &app.status_message {
        Line::from(Span::styled(
            msg.as_str(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ))
    } else if app.key_release_supported {
        Line::from(Span::styled(
            "-- LIVE --",
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(Span::styled(
            "-- LIVE (timed release) --",
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ))
    };
    frame.render_widget(Paragraph::new(status_line), chunks[5]);

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Settings;
    use crate::audio::{AudioContext, SAMPLE_RATE};
    use crate::piano::NoteTable;
    use crate::session::Session;
    use std::sync::Arc;

    #[test]
    fn test_buttons_follow_recording_state() {
        let mut app = App::new(NoteTable::default(), Settings::default());
        assert!(enabled_buttons(&app).iter().all(|(_, enabled)| !enabled));

        let ctx = AudioContext::offline(SAMPLE_RATE);
        let session = Session::with_context(ctx, None, Arc::new(NoteTable::default()));
        app.begin(session);
        assert_eq!(
            enabled_buttons(&app),
            [
                (Button::StartRecording, true),
                (Button::StopRecording, false),
                (Button::Save, false),
                (Button::Play, false),
            ]
        );

        app.start_recording();
        assert_eq!(enabled_buttons(&app)[0], (Button::StartRecording, false));
        assert_eq!(enabled_buttons(&app)[1], (Button::StopRecording, true));

        app.stop_recording();
        assert_eq!(enabled_buttons(&app)[2], (Button::Save, true));
        assert_eq!(enabled_buttons(&app)[3], (Button::Play, true));
    }
}
