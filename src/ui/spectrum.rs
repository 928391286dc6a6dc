//! Spectrum bars.

use crate::app::App;
use crate::visualizer::{Bar, BAR_COUNT};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Widget};
use ratatui::Frame;

/// Partial block characters, one per eighth of a cell.
const EIGHTHS: [&str; 9] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];

/// Draws bars bottom-up, one or more columns per bar.
struct SpectrumBars<'a> {
    bars: &'a [Bar],
}

impl Widget for SpectrumBars<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let column_width = (area.width / BAR_COUNT as u16).max(1);
        let total_eighths = area.height as f32 * 8.0;

        for (i, bar) in self.bars.iter().enumerate() {
            let x_start = area.x + i as u16 * column_width;
            if x_start >= area.x + area.width {
                break;
            }

            let (r, g, b) = bar.rgb();
            let style = Style::default().fg(Color::Rgb(r, g, b));
            let mut eighths = (bar.height_percent / 100.0 * total_eighths).round() as u16;

            for y in (area.y..area.y + area.height).rev() {
                let fill = eighths.min(8);
                eighths -= fill;
                for x in x_start..(x_start + column_width).min(area.x + area.width) {
                    buf[(x, y)].set_symbol(EIGHTHS[fill as usize]).set_style(style);
                }
            }
        }
    }
}

/// Renders the spectrum panel.
pub fn render_spectrum(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Spectrum ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(session) = app.session() {
        frame.render_widget(
            SpectrumBars {
                bars: session.visualizer().bars(),
            },
            inner,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_and_minimum_bars() {
        let bars = vec![Bar::from_magnitude(0, 255), Bar::from_magnitude(1, 0)];
        let area = Rect::new(0, 0, 4, 5);
        let mut buf = Buffer::empty(area);
        SpectrumBars { bars: &bars }.render(area, &mut buf);

        // Full bar fills the whole column
        for y in 0..5 {
            assert_eq!(buf[(0, y)].symbol(), "█");
        }
        // 2% of 40 eighths rounds to one eighth at the bottom
        assert_eq!(buf[(1, 4)].symbol(), "▁");
        assert_eq!(buf[(1, 3)].symbol(), " ");
        // Columns without bars stay empty
        assert_eq!(buf[(2, 4)].symbol(), " ");
    }
}
