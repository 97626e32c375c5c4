//! SearchBar component — the query field plus the ANALYZE button.

use ratatui::crossterm::event::{KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::Paragraph,
    Frame,
};

use compass_proto::query;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_MUTED, C_SELECTION_BG},
    widgets::{
        hit,
        pane_chrome::pane_chrome,
        query_input::{InputAction, QueryInput},
    },
};

pub const BUTTON_IDLE: &str = "ANALYZE";
pub const BUTTON_LOADING: &str = "SEARCHING";

pub const HEIGHT: u16 = 3;

pub fn button_label(state: &AppState) -> &'static str {
    if state.phase().is_loading() {
        BUTTON_LOADING
    } else {
        BUTTON_IDLE
    }
}

pub struct SearchBar {
    input: QueryInput,
    button_area: Rect,
}

impl SearchBar {
    pub fn new() -> Self {
        Self {
            input: QueryInput::default(),
            button_area: Rect::default(),
        }
    }

    #[cfg(test)]
    pub fn text(&self) -> &str {
        self.input.text()
    }

    #[cfg(test)]
    pub fn set_text(&mut self, text: &str) {
        self.input.set_value(text);
    }
}

impl Component for SearchBar {
    fn id(&self) -> ComponentId {
        ComponentId::SearchBar
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match self.input.handle_key(key) {
            // Enter in the field searches even while loading; the newer
            // request simply supersedes the older one.
            InputAction::Submitted(text) => vec![Action::Submit(text)],
            InputAction::Escaped if state.phase().is_loading() => vec![Action::CancelSearch],
            InputAction::Escaped => vec![Action::FocusNext],
            InputAction::Edited | InputAction::None => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            if hit(self.button_area, event.column, event.row) && !state.phase().is_loading() {
                return vec![Action::Submit(self.input.text().to_string())];
            }
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::SearchTerm(term) = action {
            // A blank term starts no search, so the field keeps its text.
            if !query::is_blank(term) {
                self.input.set_value(term);
            }
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("search", focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label = button_label(state);
        let button_w = label.len() as u16 + 4;
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(button_w),
            ])
            .split(inner);

        self.input.draw(frame, cols[1], focused);

        let button_style = if state.phase().is_loading() {
            Style::default().fg(C_MUTED).bg(C_SELECTION_BG)
        } else {
            Style::default()
                .fg(C_ACCENT)
                .bg(C_SELECTION_BG)
                .add_modifier(Modifier::BOLD)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!("[ {} ]", label), button_style)),
            cols[3],
        );
        self.button_area = cols[3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(col: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: col,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_tag_click_overwrites_field() {
        let state = AppState::new("http://127.0.0.1:8000/analyze");
        let mut bar = SearchBar::new();
        bar.set_text("Grouper, Julee Cruise");
        bar.on_action(&Action::SearchTerm("Ethiopian Funk".into()), &state);
        assert_eq!(bar.text(), "Ethiopian Funk");
    }

    #[test]
    fn test_blank_tag_keeps_field() {
        let state = AppState::new("http://127.0.0.1:8000/analyze");
        let mut bar = SearchBar::new();
        bar.set_text("Grouper, Slowdive");
        bar.on_action(&Action::SearchTerm("   ".into()), &state);
        bar.on_action(&Action::SearchTerm(String::new()), &state);
        assert_eq!(bar.text(), "Grouper, Slowdive");
    }

    #[test]
    fn test_enter_submits_and_esc_depends_on_loading() {
        let mut state = AppState::new("http://127.0.0.1:8000/analyze");
        let mut bar = SearchBar::new();
        bar.set_text("Sade");
        assert!(matches!(
            bar.handle_key(key(KeyCode::Enter), &state).as_slice(),
            [Action::Submit(t)] if t == "Sade"
        ));
        assert!(matches!(
            bar.handle_key(key(KeyCode::Esc), &state).as_slice(),
            [Action::FocusNext]
        ));

        state.search.submit("Sade");
        assert!(matches!(
            bar.handle_key(key(KeyCode::Esc), &state).as_slice(),
            [Action::CancelSearch]
        ));
    }

    #[test]
    fn test_button_is_disabled_while_loading() {
        let mut state = AppState::new("http://127.0.0.1:8000/analyze");
        let mut bar = SearchBar::new();
        bar.set_text("Sade");
        bar.button_area = Rect::new(30, 1, 13, 1);
        let area = Rect::new(0, 0, 50, 3);

        assert_eq!(button_label(&state), "ANALYZE");
        assert!(matches!(
            bar.handle_mouse(click(31, 1), area, &state).as_slice(),
            [Action::Submit(_)]
        ));

        state.search.submit("Sade");
        assert_eq!(button_label(&state), "SEARCHING");
        assert!(bar.handle_mouse(click(31, 1), area, &state).is_empty());
        // Outside the button does nothing either way.
        assert!(bar.handle_mouse(click(2, 1), area, &state).is_empty());
    }
}
