//! TagCloud component — the clickable tags above the cards.
//!
//! Landing screen: "Or start a journey with:" and the starter suggestions.
//! After a response: "Current Coordinates" and the returned tags.
//! Either way activating a tag searches for exactly that tag.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_PANEL_BORDER_FOCUSED, C_PRIMARY, C_SECONDARY},
    widgets::chips::{chip_at, draw_chips, layout_chips, rows_needed},
};

pub const SUGGESTION_LABEL: &str = "Or start a journey with:";
pub const RESULTS_LABEL: &str = "Current Coordinates";

const INDENT: u16 = 2;

pub struct TagCloud {
    selected: usize,
    labels: Vec<String>,
    rects: Vec<Rect>,
}

impl TagCloud {
    pub fn new() -> Self {
        Self {
            selected: 0,
            labels: Vec::new(),
            rects: Vec::new(),
        }
    }

    /// Rows needed at `width`, or 0 when there is nothing to show.
    pub fn height(state: &AppState, width: u16) -> u16 {
        let labels = state.cloud_tags();
        if labels.is_empty() {
            return 0;
        }
        1 + rows_needed(&labels, width.saturating_sub(INDENT * 2))
    }

    fn activate(&mut self, index: usize) -> Vec<Action> {
        match self.labels.get(index) {
            Some(label) => {
                self.selected = index;
                vec![Action::SearchTerm(label.clone())]
            }
            None => vec![],
        }
    }
}

impl Component for TagCloud {
    fn id(&self) -> ComponentId {
        ComponentId::TagCloud
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        // Labels may not have been drawn yet (e.g. right after a response).
        self.labels = state.cloud_tags();
        let n = self.labels.len();
        if n == 0 {
            return vec![];
        }
        self.selected = self.selected.min(n - 1);
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected = if self.selected == 0 { n - 1 } else { self.selected - 1 };
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.selected = (self.selected + 1) % n;
            }
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => self.selected = n - 1,
            KeyCode::Enter | KeyCode::Char(' ') => return self.activate(self.selected),
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            if let Some(i) = chip_at(&self.rects, event.column, event.row) {
                return self.activate(i);
            }
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::Submit(_) | Action::SearchTerm(_) = action {
            self.selected = 0;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.labels = state.cloud_tags();
        self.rects.clear();
        if self.labels.is_empty() || area.height == 0 {
            return;
        }
        self.selected = self.selected.min(self.labels.len() - 1);

        let caption = if state.phase().shows_suggestions() {
            SUGGESTION_LABEL
        } else {
            RESULTS_LABEL
        };
        let (marker, caption_style) = if focused {
            (
                Span::styled("▸ ", Style::default().fg(C_PANEL_BORDER_FOCUSED)),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )
        } else {
            (Span::raw("  "), Style::default().fg(C_SECONDARY))
        };
        let mut caption_spans = vec![marker, Span::styled(caption, caption_style)];
        if focused {
            caption_spans.push(Span::styled(
                "   ←→ pick · Enter search",
                Style::default().fg(C_MUTED),
            ));
        }
        frame.render_widget(
            Paragraph::new(Line::from(caption_spans)),
            Rect { height: 1, ..area },
        );

        let chips_area = Rect {
            x: area.x + INDENT,
            y: area.y + 1,
            width: area.width.saturating_sub(INDENT * 2),
            height: area.height - 1,
        };
        self.rects = layout_chips(&self.labels, chips_area);
        let selected = focused.then_some(self.selected);
        draw_chips(frame, &self.rects, &self.labels, selected);
    }
}
