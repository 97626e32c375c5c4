//! Color palette and style constants for the compass TUI.

use ratatui::style::{Color, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(16, 10, 22);
pub const C_ACCENT: Color = Color::Rgb(214, 120, 255);
pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);
pub const C_LOADING: Color = Color::Rgb(255, 184, 80);
pub const C_ERROR: Color = Color::Rgb(255, 80, 80);
pub const C_MUTED: Color = Color::Rgb(88, 72, 104);
pub const C_SEPARATOR: Color = Color::Rgb(46, 30, 60);
pub const C_SECONDARY: Color = Color::Rgb(140, 120, 160);
pub const C_PRIMARY: Color = Color::Rgb(225, 215, 235);
pub const C_SELECTION_BG: Color = Color::Rgb(42, 10, 56); // #2a0a38, the placeholder art colour
pub const C_PANEL_BORDER: Color = Color::Rgb(46, 30, 60);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(170, 100, 230);
pub const C_INPUT_BG: Color = Color::Rgb(26, 16, 36);
pub const C_INPUT_FG: Color = Color::Rgb(255, 200, 80);
pub const C_TAG: Color = Color::Rgb(120, 170, 230);
pub const C_TAG_SELECTED: Color = Color::Rgb(255, 200, 80);
pub const C_LINK: Color = Color::Rgb(100, 180, 150);
pub const C_TOAST_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(80, 200, 120);
pub const C_TOAST_WARNING: Color = Color::Rgb(255, 184, 80);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 95, 95);
pub const C_BADGE_ONLINE: Color = Color::Rgb(80, 200, 120);
pub const C_BADGE_OFFLINE: Color = Color::Rgb(255, 95, 95);
pub const C_BADGE_PENDING: Color = Color::Rgb(255, 184, 80);
pub const C_MODE_NORMAL: Color = Color::Rgb(140, 120, 160);
pub const C_MODE_INPUT: Color = Color::Rgb(255, 200, 80);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}
