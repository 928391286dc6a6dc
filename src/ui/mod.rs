//! Terminal user interface components.
//!
//! This module provides the visual components of the piano: the transport
//! bar, the spectrum display, the keyboard and the overlays.

mod dialogs;
mod help;
mod keyboard;
mod spectrum;
mod transport;

use crate::app::{App, LayoutRegions, Phase};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub use dialogs::{render_failure, render_welcome};
pub use help::render_help;
pub use keyboard::{render_keyboard, KEYBOARD_HEIGHT};
pub use spectrum::render_spectrum;
pub use transport::render_transport;

/// Splits the screen into transport, spectrum, keyboard and footer.
fn calculate_layout(size: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),               // Transport
            Constraint::Min(4),                  // Spectrum
            Constraint::Length(KEYBOARD_HEIGHT), // Keyboard
            Constraint::Length(1),               // Footer
        ])
        .split(size);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![
        Span::styled("F1", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(" help  ", Style::default().fg(Color::DarkGray)),
        Span::styled("F2-F5", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(" record/stop/save/play  ", Style::default().fg(Color::DarkGray)),
        Span::styled("Esc", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(" quit", Style::default().fg(Color::DarkGray)),
    ]));
    frame.render_widget(footer, area);
}

/// Renders the complete UI and updates layout regions.
///
/// The layout is divided into:
/// - Top: Transport with the recording buttons and status
/// - Center: Spectrum bars
/// - Bottom: Piano keyboard
///
/// On the welcome screen and the capability notice an overlay covers the
/// piano and only its own controls are clickable.
pub fn render(frame: &mut Frame, app: &mut App) {
    let [transport_area, spectrum_area, keyboard_area, footer_area] =
        calculate_layout(frame.area());

    let buttons = render_transport(frame, transport_area, app);
    render_spectrum(frame, spectrum_area, app);
    let keys = render_keyboard(frame, keyboard_area, app);
    render_footer(frame, footer_area);

    let layout = match &app.phase {
        Phase::Running(_) => LayoutRegions { keys, buttons },
        Phase::Welcome => LayoutRegions {
            keys: Vec::new(),
            buttons: render_welcome(frame, app),
        },
        Phase::Failed(message) => {
            render_failure(frame, message);
            LayoutRegions::default()
        }
    };

    if app.show_help {
        render_help(frame, app.table());
    }

    app.layout = layout;
}

/// Helper function to center a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Button, Settings};
    use crate::audio::{AudioContext, SAMPLE_RATE};
    use crate::piano::NoteTable;
    use crate::session::Session;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::Arc;

    #[test]
    fn test_welcome_exposes_only_start_button() {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let mut app = App::new(NoteTable::default(), Settings::default());
        terminal.draw(|f| render(f, &mut app)).unwrap();

        assert!(app.layout.keys.is_empty());
        assert_eq!(app.layout.buttons.len(), 1);
        assert_eq!(app.layout.buttons[0].1, Button::Start);
    }

    #[test]
    fn test_running_layout_has_keys() {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let mut app = App::new(NoteTable::default(), Settings::default());
        let ctx = AudioContext::offline(SAMPLE_RATE);
        app.begin(Session::with_context(ctx, None, Arc::new(NoteTable::default())));
        terminal.draw(|f| render(f, &mut app)).unwrap();

        // 21 naturals and 15 altered keys fit in 118 columns
        assert_eq!(app.layout.keys.len(), 36);
        assert!(app
            .layout
            .buttons
            .iter()
            .any(|(_, b)| *b == Button::StartRecording));
    }

    #[test]
    fn test_failure_has_no_regions() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = App::new(NoteTable::default(), Settings::default());
        app.begin(Err(crate::error::PianoError::CapabilityMissing(
            "no device".into(),
        )));
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(app.layout.keys.is_empty());
        assert!(app.layout.buttons.is_empty());
    }
}
