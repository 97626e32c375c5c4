//! RecommendationList component — one card per recommended artist.
//!
//! Card rows, top to bottom:
//! ```text
//!   ▣ <image url or placeholder>
//!   Artist Name   Last.fm ↗
//!   [chip] [chip] [chip]          (only when the artist has tags)
//!   explanation, word-wrapped      (only when present)
//!   [▶] Play Preview · track       (only when a preview URL exists)
//! ```
//! Cards vary in height, so scrolling is by whole cards: `scroll` is the
//! first card drawn.  Every clickable piece of the last frame is kept in
//! `hits` for mouse routing.

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
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use compass_proto::protocol::{Recommendation, PLACEHOLDER_IMAGE};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_LINK, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY},
    widgets::{
        cell_width,
        chips::{draw_chips, layout_chips, rows_needed},
        hit,
        pane_chrome::{pane_chrome, Badge},
        to_cells,
    },
};

pub const LINK_LABEL: &str = "Last.fm ↗";

/// Left gutter: selection bar plus a space.
const GUTTER: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hit {
    Card(usize),
    Link(usize),
    Chip(usize, usize),
    Player(usize),
}

pub struct RecommendationList {
    selected: usize,
    chip: usize,
    scroll: usize,
    hits: Vec<(Rect, Hit)>,
}

/// Greedy word wrap by display width.  Words wider than `width` are split.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if width == 0 {
        return lines;
    }
    let mut line = String::new();
    let mut line_w = 0usize;
    for word in text.split_whitespace() {
        let word_w = word.width();
        let needed = if line.is_empty() { word_w } else { word_w + 1 };
        if line_w + needed <= width {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
            line_w += needed;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
            line_w = 0;
        }
        if word_w <= width {
            line.push_str(word);
            line_w = word_w;
        } else {
            for c in word.chars() {
                let cw = c.width().unwrap_or(0);
                if line_w + cw > width && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    line_w = 0;
                }
                line.push(c);
                line_w += cw;
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Total rows a card takes at content width `width`, including the blank
/// separator row.
pub fn card_height(rec: &Recommendation, has_player: bool, width: u16) -> u16 {
    let explanation = rec.explanation().map_or(0, |e| {
        u16::try_from(wrap_words(e, usize::from(width)).len()).unwrap_or(u16::MAX)
    });
    rows_needed(&rec.tags, width)
        .saturating_add(explanation)
        .saturating_add(u16::from(has_player))
        .saturating_add(3)
}

impl RecommendationList {
    pub fn new() -> Self {
        Self {
            selected: 0,
            chip: 0,
            scroll: 0,
            hits: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.selected = 0;
        self.chip = 0;
        self.scroll = 0;
    }

    fn select(&mut self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let index = index.min(count - 1);
        if index != self.selected {
            self.chip = 0;
        }
        self.selected = index;
    }

    fn move_by(&mut self, delta: isize, count: usize) {
        let target = (self.selected as isize + delta).max(0) as usize;
        self.select(target, count);
    }

    /// Move `scroll` so the selected card is fully on screen if it can be.
    fn ensure_visible(&mut self, heights: &[u16], view_h: u16) {
        if self.selected < self.scroll {
            self.scroll = self.selected;
            return;
        }
        while self.scroll < self.selected {
            let used: u32 = heights[self.scroll..=self.selected]
                .iter()
                .map(|&h| u32::from(h))
                .sum();
            if used <= u32::from(view_h) {
                break;
            }
            self.scroll += 1;
        }
    }

    fn hit_at(&self, col: u16, row: u16) -> Option<Hit> {
        self.hits
            .iter()
            .find(|(r, _)| hit(*r, col, row))
            .map(|&(_, h)| h)
    }

    fn draw_card(
        &mut self,
        frame: &mut Frame,
        index: usize,
        rec: &Recommendation,
        area: Rect,
        y: u16,
        focused: bool,
        state: &AppState,
    ) {
        let bottom = area.y + area.height;
        let is_selected = index == self.selected;
        let x = area.x + GUTTER;
        let width = area.width.saturating_sub(GUTTER);
        let has_player = state.player(index).is_some();
        let height = card_height(rec, has_player, width);
        let mut row = y;

        let line_at = |row: u16| Rect {
            x,
            y: row,
            width,
            height: 1,
        };

        // Selection bar across the card body (not the separator).
        if is_selected {
            let bar_style = if focused {
                Style::default().fg(C_ACCENT)
            } else {
                Style::default().fg(C_MUTED)
            };
            for r in y..y.saturating_add(height - 1).min(bottom) {
                frame.render_widget(
                    Paragraph::new(Span::styled("▌", bar_style)),
                    Rect {
                        x: area.x,
                        y: r,
                        width: 1,
                        height: 1,
                    },
                );
            }
        }

        // Image line.
        if row < bottom {
            let image = rec.image_or_placeholder();
            let image_style = if image == PLACEHOLDER_IMAGE {
                Style::default().fg(C_MUTED).add_modifier(Modifier::DIM)
            } else {
                Style::default().fg(C_MUTED)
            };
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled("▣ ", Style::default().fg(C_SECONDARY)),
                    Span::styled(image, image_style),
                ])),
                line_at(row),
            );
        }
        row += 1;

        // Name and profile link.
        if row < bottom {
            let name_style = if is_selected {
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
            };
            let link_style = if rec.profile_url().is_some() {
                Style::default()
                    .fg(C_LINK)
                    .add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().fg(C_MUTED)
            };
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(rec.artist.as_str(), name_style),
                    Span::raw("   "),
                    Span::styled(LINK_LABEL, link_style),
                ])),
                line_at(row),
            );
            let link_x = x.saturating_add(cell_width(&rec.artist)).saturating_add(3);
            if link_x < x + width {
                let link_w = cell_width(LINK_LABEL).min(x + width - link_x);
                self.hits
                    .push((Rect::new(link_x, row, link_w, 1), Hit::Link(index)));
            }
        }
        row += 1;

        // Tag chips.
        let chip_rows = rows_needed(&rec.tags, width);
        if chip_rows > 0 && row < bottom {
            let chips_area = Rect {
                x,
                y: row,
                width,
                height: chip_rows.min(bottom - row),
            };
            let rects = layout_chips(&rec.tags, chips_area);
            let selected_chip = (focused && is_selected).then_some(self.chip);
            draw_chips(frame, &rects, &rec.tags, selected_chip);
            for (j, r) in rects.into_iter().enumerate() {
                self.hits.push((r, Hit::Chip(index, j)));
            }
        }
        row += chip_rows;

        // Explanation.
        if let Some(text) = rec.explanation() {
            for line in wrap_words(text, usize::from(width)) {
                if row < bottom {
                    frame.render_widget(
                        Paragraph::new(Span::styled(line, Style::default().fg(C_SECONDARY))),
                        line_at(row),
                    );
                }
                row += 1;
            }
        }

        // Preview player.
        if let Some(player) = state.player(index) {
            if row < bottom {
                let (button_style, label_style) = if player.is_playing() {
                    (
                        Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD),
                        Style::default().fg(C_PLAYING),
                    )
                } else {
                    (
                        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
                        Style::default().fg(C_SECONDARY),
                    )
                };
                let button = format!("[{}]", player.glyph());
                let mut spans = vec![
                    Span::styled(button.clone(), button_style),
                    Span::raw(" "),
                    Span::styled(player.label(), label_style),
                ];
                if let Some(track) = rec.sample_track.as_deref().filter(|t| !t.trim().is_empty()) {
                    spans.push(Span::styled(
                        format!("  · {}", track),
                        Style::default().fg(C_MUTED),
                    ));
                }
                frame.render_widget(Paragraph::new(Line::from(spans)), line_at(row));
                let player_w = to_cells(button.width() + 1 + player.label().width());
                self.hits.push((
                    Rect::new(x, row, player_w.min(width), 1),
                    Hit::Player(index),
                ));
            }
        }

        // Whole card, checked after the specific targets above.
        let visible_h = y.saturating_add(height - 1).min(bottom).saturating_sub(y);
        if visible_h > 0 {
            self.hits.push((
                Rect::new(area.x, y, area.width, visible_h),
                Hit::Card(index),
            ));
        }
    }
}

impl Component for RecommendationList {
    fn id(&self) -> ComponentId {
        ComponentId::Recommendations
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let recs = state.phase().recommendations();
        let count = recs.len();
        if count == 0 {
            return vec![];
        }
        self.select(self.selected, count);
        let rec = &recs[self.selected];

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_by(-1, count),
            KeyCode::Down | KeyCode::Char('j') => self.move_by(1, count),
            KeyCode::PageUp => self.move_by(-5, count),
            KeyCode::PageDown => self.move_by(5, count),
            KeyCode::Home | KeyCode::Char('g') => self.select(0, count),
            KeyCode::End | KeyCode::Char('G') => self.select(count - 1, count),
            KeyCode::Left | KeyCode::Char('h') => {
                self.chip = self.chip.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.chip + 1 < rec.tags.len() {
                    self.chip += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(tag) = rec.tags.get(self.chip) {
                    return vec![Action::SearchTerm(tag.clone())];
                }
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                if state.player(self.selected).is_some() {
                    return vec![Action::TogglePreview(self.selected)];
                }
            }
            KeyCode::Char('y') => {
                if let Some(url) = rec.profile_url() {
                    return vec![Action::CopyToClipboard(url.to_string())];
                }
            }
            KeyCode::Char('o') => {
                return vec![Action::CopyToClipboard(
                    rec.image_or_placeholder().to_string(),
                )];
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        let recs = state.phase().recommendations();
        let count = recs.len();
        match event.kind {
            MouseEventKind::ScrollUp => self.move_by(-1, count),
            MouseEventKind::ScrollDown => self.move_by(1, count),
            MouseEventKind::Down(MouseButton::Left) => {
                match self.hit_at(event.column, event.row) {
                    Some(Hit::Chip(i, j)) => {
                        self.select(i, count);
                        self.chip = j;
                        if let Some(tag) = recs.get(i).and_then(|r| r.tags.get(j)) {
                            return vec![Action::SearchTerm(tag.clone())];
                        }
                    }
                    Some(Hit::Player(i)) => {
                        self.select(i, count);
                        return vec![Action::TogglePreview(i)];
                    }
                    Some(Hit::Link(i)) => {
                        self.select(i, count);
                        if let Some(url) = recs.get(i).and_then(|r| r.profile_url()) {
                            return vec![Action::CopyToClipboard(url.to_string())];
                        }
                    }
                    Some(Hit::Card(i)) => self.select(i, count),
                    None => {}
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::Submit(_) | Action::SearchTerm(_) = action {
            self.reset();
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.hits.clear();
        let recs = state.phase().recommendations();
        let count_label = format!("{} found", recs.len());
        let block = pane_chrome(
            "recommendations",
            focused,
            Some(Badge {
                text: &count_label,
                color: C_SECONDARY,
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if recs.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "  no recommendations for these coordinates",
                    Style::default().fg(C_MUTED),
                )),
                inner,
            );
            return;
        }
        if inner.height == 0 || inner.width <= GUTTER {
            return;
        }

        self.select(self.selected, recs.len());
        let content_w = inner.width - GUTTER;
        let heights: Vec<u16> = recs
            .iter()
            .enumerate()
            .map(|(i, r)| card_height(r, state.player(i).is_some(), content_w))
            .collect();
        self.ensure_visible(&heights, inner.height);
        self.scroll = self.scroll.min(recs.len() - 1);

        let bottom = inner.y + inner.height;
        let mut y = inner.y;
        for index in self.scroll..recs.len() {
            if y >= bottom {
                break;
            }
            self.draw_card(frame, index, &recs[index], inner, y, focused, state);
            y = y.saturating_add(heights[index]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::players_for;
    use compass_proto::protocol::AnalyzeResponse;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn rec(artist: &str, tags: &[&str], sample: Option<&str>) -> Recommendation {
        Recommendation {
            artist: artist.into(),
            last_fm_url: Some(format!("https://www.last.fm/music/{}", artist)),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            explanation: Some("Hazy, tape-saturated loops.".into()),
            sample_url: sample.map(str::to_string),
            ..Default::default()
        }
    }

    fn state_with(recs: Vec<Recommendation>) -> AppState {
        let mut state = AppState::new("http://127.0.0.1:8000/analyze");
        let t = state.search.submit("Boards of Canada").unwrap();
        state.players = players_for(t.seq, &recs);
        state.search.resolve(
            t.seq,
            Ok(AnalyzeResponse {
                tags: vec!["idm".into()],
                recommendations: recs,
            }),
        );
        state
    }

    #[test]
    fn test_wrap_words() {
        assert_eq!(
            wrap_words("a quiet storm of tape hiss", 10),
            vec!["a quiet", "storm of", "tape hiss"]
        );
        assert_eq!(wrap_words("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert!(wrap_words("   ", 10).is_empty());
        assert!(wrap_words("word", 0).is_empty());
    }

    #[test]
    fn test_card_height_counts_optional_rows() {
        let bare = Recommendation {
            artist: "Bare".into(),
            ..Default::default()
        };
        // image + name + separator
        assert_eq!(card_height(&bare, false, 40), 3);
        let full = rec("Full", &["a", "b"], Some("https://example.test/s.m4a"));
        // + one chip row + one explanation line + player
        assert_eq!(card_height(&full, true, 40), 6);
    }

    #[test]
    fn test_card_height_saturates_on_huge_explanation() {
        let wordy = Recommendation {
            artist: "Wordy".into(),
            explanation: Some("la ".repeat(70_000)),
            ..Default::default()
        };
        assert_eq!(card_height(&wordy, false, 3), u16::MAX);
    }

    #[test]
    fn test_keys_on_selected_card() {
        let state = state_with(vec![
            rec("Tycho", &["chillwave"], None),
            rec("Bibio", &["folktronica", "idm"], Some("https://example.test/b.m4a")),
        ]);
        let mut list = RecommendationList::new();

        // No player on the first card.
        assert!(list.handle_key(key(KeyCode::Char('p')), &state).is_empty());

        list.handle_key(key(KeyCode::Down), &state);
        assert_eq!(list.selected, 1);
        assert!(matches!(
            list.handle_key(key(KeyCode::Char(' ')), &state).as_slice(),
            [Action::TogglePreview(1)]
        ));

        list.handle_key(key(KeyCode::Right), &state);
        assert!(matches!(
            list.handle_key(key(KeyCode::Enter), &state).as_slice(),
            [Action::SearchTerm(t)] if t == "idm"
        ));
        assert!(matches!(
            list.handle_key(key(KeyCode::Char('y')), &state).as_slice(),
            [Action::CopyToClipboard(u)] if u == "https://www.last.fm/music/Bibio"
        ));
        assert!(matches!(
            list.handle_key(key(KeyCode::Char('o')), &state).as_slice(),
            [Action::CopyToClipboard(u)] if u == PLACEHOLDER_IMAGE
        ));

        // Selection is clamped at the end.
        list.handle_key(key(KeyCode::Down), &state);
        assert_eq!(list.selected, 1);
    }

    #[test]
    fn test_mouse_prefers_specific_targets_over_card() {
        let state = state_with(vec![rec("Bibio", &["idm"], Some("https://example.test/b.m4a"))]);
        let mut list = RecommendationList::new();
        list.hits = vec![
            (Rect::new(4, 3, 5, 1), Hit::Chip(0, 0)),
            (Rect::new(2, 5, 16, 1), Hit::Player(0)),
            (Rect::new(0, 1, 40, 5), Hit::Card(0)),
        ];
        let click = |col, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: col,
            row,
            modifiers: KeyModifiers::NONE,
        };
        let area = Rect::new(0, 0, 42, 10);
        assert!(matches!(
            list.handle_mouse(click(5, 3), area, &state).as_slice(),
            [Action::SearchTerm(t)] if t == "idm"
        ));
        assert!(matches!(
            list.handle_mouse(click(3, 5), area, &state).as_slice(),
            [Action::TogglePreview(0)]
        ));
        assert!(list.handle_mouse(click(30, 2), area, &state).is_empty());
    }

    #[test]
    fn test_ensure_visible_scrolls_by_cards() {
        let mut list = RecommendationList::new();
        let heights = [4, 4, 4, 4];
        list.selected = 3;
        list.ensure_visible(&heights, 9);
        assert_eq!(list.scroll, 2);
        list.selected = 0;
        list.ensure_visible(&heights, 9);
        assert_eq!(list.scroll, 0);
    }

    #[test]
    fn test_new_search_resets_selection() {
        let state = state_with(vec![rec("a", &[], None), rec("b", &[], None)]);
        let mut list = RecommendationList::new();
        list.handle_key(key(KeyCode::End), &state);
        assert_eq!(list.selected, 1);
        list.on_action(&Action::SearchTerm("idm".into()), &state);
        assert_eq!(list.selected, 0);
    }
}
