//! Help overlay rendering.
//!
//! Lists the control keys and the note keys of the active table.

use crate::piano::{NoteTable, Row};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use super::centered_rect;

/// Key binding entry for the help display.
struct KeyBinding {
    key: &'static str,
    description: &'static str,
}

const GENERAL_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "F1",
        description: "Toggle this help",
    },
    KeyBinding {
        key: "Esc / Ctrl+C",
        description: "Quit",
    },
    KeyBinding {
        key: "Enter / Space",
        description: "Start audio from the welcome screen",
    },
];

const RECORDING_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "F2",
        description: "Start recording",
    },
    KeyBinding {
        key: "F3",
        description: "Stop recording",
    },
    KeyBinding {
        key: "F4",
        description: "Save the latest take as WAV",
    },
    KeyBinding {
        key: "F5",
        description: "Play / stop the latest take",
    },
];

const MOUSE_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "Click key",
        description: "Play the note until the button is released",
    },
    KeyBinding {
        key: "Click button",
        description: "Use the transport buttons",
    },
];

/// One line per row of the table: note label followed by its key.
fn note_key_lines(table: &NoteTable, key_style: Style, desc_style: Style) -> Vec<Line<'static>> {
    Row::ALL
        .iter()
        .map(|&row| {
            let mut spans = vec![Span::styled(format!("{:15}", row.to_string()), key_style)];
            for entry in table.row(row).iter().filter(|e| !e.is_gap()) {
                if let Some(ch) = entry.key.and_then(|k| k.to_char()) {
                    spans.push(Span::styled(format!("{}={} ", entry.label, ch), desc_style));
                }
            }
            Line::from(spans)
        })
        .collect()
}

/// Renders the help overlay.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `table` - Note table whose key bindings are listed
pub fn render_help(frame: &mut Frame, table: &NoteTable) {
    let area = centered_rect(70, 80, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help - Keyboard Shortcuts ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(Color::White);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let sections: [(&'static str, &[KeyBinding]); 3] = [
        ("General", GENERAL_BINDINGS),
        ("Recording", RECORDING_BINDINGS),
        ("Mouse Controls", MOUSE_BINDINGS),
    ];
    for (title, bindings) in sections {
        lines.push(Line::from(Span::styled(title, section_style)));
        for binding in bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("{:15}", binding.key), key_style),
                Span::styled(binding.description, desc_style),
            ]));
        }
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled("Notes", section_style)));
    lines.extend(note_key_lines(table, key_style, desc_style));

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        chunks[0],
    );

    let footer = Paragraph::new(Line::from(Span::styled(
        "Close: F1/Esc",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));
    frame.render_widget(footer, chunks[1]);
}
