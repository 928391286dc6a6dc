//! Piano keyboard display.
//!
//! Draws one element per note table slot: natural notes as a row of white
//! keys, altered notes as a row of black keys offset by half a key. Pressed
//! keys are highlighted from the dispatcher's key elements.

use crate::app::App;
use crate::piano::{KeyElements, NoteTable, Row};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Width of a white key in columns.
pub const KEY_WIDTH: u16 = 4;

/// Width of a black key in columns.
const BLACK_KEY_WIDTH: u16 = 3;

/// Rows used by the black key row.
const BLACK_ROW_HEIGHT: u16 = 2;

/// Rows used by the white key row.
const WHITE_ROW_HEIGHT: u16 = 3;

/// Total height of the keyboard panel including borders.
pub const KEYBOARD_HEIGHT: u16 = BLACK_ROW_HEIGHT + WHITE_ROW_HEIGHT + 2;

fn key_style(row: Row, playing: bool) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match (row, playing) {
        (_, true) => style.fg(Color::Black).bg(Color::Yellow),
        (Row::Natural, false) => style.fg(Color::Black).bg(Color::White),
        (Row::Altered, false) => style.fg(Color::White).bg(Color::DarkGray),
    }
}

/// Screen rectangle of a key slot, or `None` if it falls outside `inner`.
fn key_rect(inner: Rect, row: Row, index: usize) -> Option<Rect> {
    let index = u16::try_from(index).ok()?;
    let (x_offset, y, width, height) = match row {
        Row::Natural => (
            index * KEY_WIDTH,
            inner.y + BLACK_ROW_HEIGHT,
            KEY_WIDTH,
            WHITE_ROW_HEIGHT,
        ),
        Row::Altered => (
            index * KEY_WIDTH + KEY_WIDTH - 1,
            inner.y,
            BLACK_KEY_WIDTH,
            BLACK_ROW_HEIGHT,
        ),
    };

    if x_offset + width > inner.width || y + height > inner.y + inner.height {
        return None;
    }
    Some(Rect::new(inner.x + x_offset, y, width, height))
}

/// Renders the keyboard and returns the hit regions of every drawn key.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `area` - The area to render in
/// * `app` - Application state
pub fn render_keyboard(frame: &mut Frame, area: Rect, app: &App) -> Vec<(Rect, Row, usize)> {
    let block = Block::default()
        .title(" Keyboard ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let table = app.table();
    let idle;
    let elements = match app.session() {
        Some(session) => session.dispatcher().elements(),
        None => {
            idle = KeyElements::for_table(table);
            &idle
        }
    };

    let mut regions = Vec::new();
    // Black keys sit above the white row and are drawn first so their hit
    // regions win when scanning in order.
    for row in [Row::Altered, Row::Natural] {
        regions.extend(render_row(frame, inner, table, elements, row));
    }
    regions
}

fn render_row(
    frame: &mut Frame,
    inner: Rect,
    table: &NoteTable,
    elements: &KeyElements,
    row: Row,
) -> Vec<(Rect, Row, usize)> {
    let mut regions = Vec::new();

    for (index, (entry, element)) in table.row(row).iter().zip(elements.row(row)).enumerate() {
        if entry.is_gap() {
            continue;
        }
        let Some(rect) = key_rect(inner, row, index) else {
            break;
        };

        let key_char = entry
            .key
            .and_then(|k| k.to_char())
            .map(String::from)
            .unwrap_or_default();
        let mut lines = vec![Line::from(entry.label.clone()), Line::from(key_char)];
        if row == Row::Natural {
            lines.insert(0, Line::from(""));
        }

        frame.render_widget(
            Paragraph::new(lines).style(key_style(row, element.is_playing())),
            rect,
        );
        regions.push((rect, row, index));
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_rects_do_not_overlap_within_row() {
        let inner = Rect::new(1, 1, 200, 5);
        let table = NoteTable::default();
        for row in Row::ALL {
            let rects: Vec<Rect> = (0..table.row(row).len())
                .filter_map(|i| key_rect(inner, row, i))
                .collect();
            assert_eq!(rects.len(), table.row(row).len());
            for pair in rects.windows(2) {
                assert!(!pair[0].intersects(pair[1]));
            }
        }
    }

    #[test]
    fn test_black_key_sits_between_white_keys() {
        let inner = Rect::new(0, 0, 200, 5);
        let c = key_rect(inner, Row::Natural, 0).unwrap();
        let d = key_rect(inner, Row::Natural, 1).unwrap();
        let c_sharp = key_rect(inner, Row::Altered, 0).unwrap();
        assert!(c_sharp.x > c.x && c_sharp.x < d.x);
        assert!(c_sharp.y < c.y);
    }

    #[test]
    fn test_narrow_area_clips_keys() {
        let inner = Rect::new(0, 0, 10, 5);
        assert!(key_rect(inner, Row::Natural, 1).is_some());
        assert!(key_rect(inner, Row::Natural, 2).is_none());
    }
}
