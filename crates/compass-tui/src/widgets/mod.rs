pub mod banner;
pub mod chips;
pub mod pane_chrome;
pub mod query_input;
pub mod status_bar;
pub mod toast;

use ratatui::layout::Rect;
use unicode_width::UnicodeWidthStr;

/// Display width of `s` in terminal cells, saturating at `u16::MAX`.
pub fn cell_width(s: &str) -> u16 {
    to_cells(s.width())
}

pub fn to_cells(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Is the cell (`col`, `row`) inside `r`?
pub fn hit(r: Rect, col: u16, row: u16) -> bool {
    r.width > 0
        && r.height > 0
        && col >= r.x
        && col < r.x.saturating_add(r.width)
        && row >= r.y
        && row < r.y.saturating_add(r.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_width_saturates() {
        assert_eq!(cell_width("Dreampop"), 8);
        assert_eq!(cell_width("東京"), 4);
        let huge = "a".repeat(usize::from(u16::MAX) + 10);
        assert_eq!(cell_width(&huge), u16::MAX);
    }
}
