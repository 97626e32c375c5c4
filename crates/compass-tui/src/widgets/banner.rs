//! Error banner and the loading indicator shown under the search bar.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ERROR, C_LOADING, C_MUTED, C_SEPARATOR};

pub const LOADING_TEXT: &str = "Triangulating obscure frequencies...";
pub const LOADING_HEIGHT: u16 = 2;

const PULSE_LEN: usize = 12;

/// Start column and length of the moving pulse on a track of `width` cells.
/// The pulse slides in from the left edge and out at the right, then repeats.
pub fn pulse_span(frame: usize, width: usize) -> (usize, usize) {
    if width == 0 {
        return (0, 0);
    }
    let len = PULSE_LEN.min(width);
    let period = width + len;
    let head = frame % period;
    let start = head.saturating_sub(len);
    let end = head.min(width);
    (start, end - start)
}

pub fn draw_error(frame: &mut Frame, area: Rect, message: &str) {
    let line = Line::from(vec![
        Span::styled(" ✗ ", Style::default().fg(C_ERROR).add_modifier(Modifier::BOLD)),
        Span::styled(message, Style::default().fg(C_ERROR)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Two rows: an animated bar and the loading caption.
pub fn draw_loading(frame: &mut Frame, area: Rect, tick: usize) {
    if area.height == 0 {
        return;
    }
    let width = area.width.saturating_sub(2) as usize;
    let (start, len) = pulse_span(tick, width);
    let bar = Line::from(vec![
        Span::raw(" "),
        Span::styled("─".repeat(start), Style::default().fg(C_SEPARATOR)),
        Span::styled("━".repeat(len), Style::default().fg(C_LOADING)),
        Span::styled(
            "─".repeat(width - start - len),
            Style::default().fg(C_SEPARATOR),
        ),
    ]);
    let caption = Line::from(Span::styled(
        format!(" {}", LOADING_TEXT),
        Style::default().fg(C_MUTED).add_modifier(Modifier::ITALIC),
    ));
    frame.render_widget(Paragraph::new(vec![bar, caption]), area);
}
