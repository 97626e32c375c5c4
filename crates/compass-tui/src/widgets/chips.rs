//! Tag chips — wrapped rows of clickable labels.
//!
//! The same layout is used to draw the chips and, afterwards, to map a mouse
//! click back to the chip under it, so both always agree.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Span,
    widgets::Paragraph,
    Frame,
};
use super::cell_width;
use crate::theme::{C_SELECTION_BG, C_TAG, C_TAG_SELECTED};

const GAP: u16 = 1;

/// Width of one chip: the label padded by a space on each side.
pub fn chip_width(label: &str) -> u16 {
    cell_width(label).saturating_add(2)
}

/// (column, row, width) relative to the top-left corner.
fn place(labels: &[String], width: u16, max_rows: u16) -> Vec<(u16, u16, u16)> {
    let mut out = Vec::with_capacity(labels.len());
    if width == 0 || max_rows == 0 {
        return out;
    }
    let (mut col, mut row) = (0u16, 0u16);
    for label in labels {
        let w = chip_width(label).min(width);
        if col > 0 && col.saturating_add(w) > width {
            col = 0;
            row += 1;
        }
        if row >= max_rows {
            break;
        }
        out.push((col, row, w));
        col = col.saturating_add(w).saturating_add(GAP);
    }
    out
}

/// Screen rectangles for as many chips as fit into `area`, in label order.
pub fn layout_chips(labels: &[String], area: Rect) -> Vec<Rect> {
    place(labels, area.width, area.height)
        .into_iter()
        .map(|(col, row, w)| Rect {
            x: area.x + col,
            y: area.y + row,
            width: w,
            height: 1,
        })
        .collect()
}

/// Rows needed to show every chip at `width`.
pub fn rows_needed(labels: &[String], width: u16) -> u16 {
    place(labels, width, u16::MAX)
        .last()
        .map_or(0, |&(_, row, _)| row + 1)
}

pub fn chip_at(rects: &[Rect], col: u16, row: u16) -> Option<usize> {
    rects.iter().position(|r| super::hit(*r, col, row))
}

pub fn draw_chips(frame: &mut Frame, rects: &[Rect], labels: &[String], selected: Option<usize>) {
    for (i, (rect, label)) in rects.iter().zip(labels).enumerate() {
        let style = if selected == Some(i) {
            Style::default()
                .fg(C_TAG_SELECTED)
                .bg(C_SELECTION_BG)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(C_TAG).bg(C_SELECTION_BG)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {} ", label), style)),
            *rect,
        );
    }
}
