//! QueryInput — wraps tui-input as the single-line search field.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};
use unicode_width::UnicodeWidthChar;

use crate::theme::{C_INPUT_BG, C_INPUT_FG, C_MUTED};

pub const PLACEHOLDER: &str = "Enter artists, genres, or a vibe...";

#[derive(Debug, PartialEq)]
pub enum InputAction {
    Edited,
    Submitted(String),
    Escaped,
    None,
}

pub struct QueryInput {
    input: Input,
    placeholder: String,
}

impl QueryInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            placeholder: placeholder.into(),
        }
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Enter submits the raw text (blank text is the controller's problem),
    /// Esc is handed back to the owner, everything else edits.
    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Enter => InputAction::Submitted(self.input.value().to_string()),
            KeyCode::Esc => InputAction::Escaped,
            _ => match self.input.handle_event(&Event::Key(key)) {
                Some(_) => InputAction::Edited,
                None => InputAction::None,
            },
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let width = area.width.saturating_sub(1) as usize;
        let scroll = self.input.visual_scroll(width);
        let value = self.input.value();
        let display = if value.is_empty() {
            Span::styled(self.placeholder.as_str(), Style::default().fg(C_MUTED))
        } else {
            Span::styled(skip_columns(value, scroll), Style::default().fg(C_INPUT_FG))
        };

        frame.render_widget(
            Paragraph::new(Line::from(display)).style(Style::default().bg(C_INPUT_BG)),
            area,
        );

        if focused && area.width > 0 {
            let offset = super::to_cells(self.input.visual_cursor().saturating_sub(scroll));
            let cursor_x = area.x.saturating_add(offset).min(area.x + area.width - 1);
            frame.set_cursor_position((cursor_x, area.y));
        }
    }
}

/// The tail of `value` after its first `cols` display columns.  A wide
/// character cut by the boundary is dropped with the skipped part.
fn skip_columns(value: &str, cols: usize) -> &str {
    let mut skipped = 0;
    for (i, c) in value.char_indices() {
        if skipped >= cols {
            return &value[i..];
        }
        skipped += c.width().unwrap_or(0);
    }
    ""
}

impl Default for QueryInput {
    fn default() -> Self {
        Self::new(PLACEHOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_then_enter_submits_raw_text() {
        let mut input = QueryInput::default();
        for c in "Sade, ".chars() {
            assert_eq!(input.handle_key(key(KeyCode::Char(c))), InputAction::Edited);
        }
        assert_eq!(
            input.handle_key(key(KeyCode::Enter)),
            InputAction::Submitted("Sade, ".to_string())
        );
        // Submitting leaves the text in place.
        assert_eq!(input.text(), "Sade, ");
    }

    #[test]
    fn test_set_value_overwrites() {
        let mut input = QueryInput::default();
        input.set_value("Grouper");
        input.set_value("Ethiopian Funk");
        assert_eq!(input.text(), "Ethiopian Funk");
        assert_eq!(input.handle_key(key(KeyCode::Esc)), InputAction::Escaped);
    }

    #[test]
    fn test_scroll_skips_display_columns() {
        assert_eq!(skip_columns("Slowdive", 0), "Slowdive");
        assert_eq!(skip_columns("Slowdive", 4), "dive");
        // Each of these takes two columns.
        assert_eq!(skip_columns("坂本龍一", 4), "龍一");
        assert_eq!(skip_columns("坂本龍一", 3), "龍一");
        assert_eq!(skip_columns("a坂本", 1), "坂本");
        assert_eq!(skip_columns("坂本", 9), "");
    }
}
