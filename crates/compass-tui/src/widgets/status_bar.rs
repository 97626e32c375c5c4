//! Status bar — bottom line with the input mode and keybindings.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_LOADING, C_MODE_INPUT, C_MODE_NORMAL, C_MUTED};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    /// Keys drive navigation and shortcuts.
    Normal,
    /// Keys go to the search field.
    Input,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "BROWSE",
            Self::Input => "SEARCH",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Input => C_MODE_INPUT,
        }
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, loading: bool) {
    let mut spans = vec![Span::styled(
        format!(" {} ", mode.label()),
        Style::default().fg(mode.color()).add_modifier(Modifier::BOLD),
    )];
    if loading {
        spans.push(Span::styled("●", Style::default().fg(C_LOADING)));
    }

    let keys = match (mode, loading) {
        (InputMode::Input, true) => " type  Enter search again  Esc cancel  Tab next pane  Ctrl+C quit",
        (InputMode::Input, false) => " type  Enter analyze  Esc leave field  Tab next pane  Ctrl+C quit",
        (InputMode::Normal, true) => " ←→ tags  ↑↓/jk cards  Enter search tag  Esc cancel  Tab panes  ? help  q quit",
        (InputMode::Normal, false) => {
            " ←→ tags  ↑↓/jk cards  Enter search tag  p/Space preview  y copy Last.fm  o copy image  / search  K keys  ? help  q quit"
        }
    };
    spans.push(Span::styled(keys, Style::default().fg(C_MUTED)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
