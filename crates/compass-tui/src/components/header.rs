//! Header — title, subtitle and the backend badge.
//!
//! On the landing screen the header is drawn as a tall centred "hero"; once
//! something is loading or showing it collapses to a single row.
//! Not focusable, so it is drawn directly rather than through `Component`.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    app_state::{AppState, BackendHealth},
    theme::{C_ACCENT, C_BADGE_OFFLINE, C_BADGE_ONLINE, C_BADGE_PENDING, C_MUTED, C_SECONDARY},
};

pub const TITLE: &str = "Sonic Compass";
pub const SUBTITLE: &str = "Navigate the underground.";

pub const HERO_HEIGHT: u16 = 6;
pub const COMPACT_HEIGHT: u16 = 1;

pub struct Header;

impl Header {
    pub fn new() -> Self {
        Self
    }

    pub fn height(state: &AppState) -> u16 {
        if state.phase().is_initial() {
            HERO_HEIGHT
        } else {
            COMPACT_HEIGHT
        }
    }
}

fn badge(state: &AppState) -> Span<'static> {
    let (text, color) = match state.health {
        BackendHealth::Online => ("● ONLINE", C_BADGE_ONLINE),
        BackendHealth::Offline => ("● OFFLINE", C_BADGE_OFFLINE),
        BackendHealth::Unknown => ("○ …", C_BADGE_PENDING),
    };
    Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

/// " S O N I C   C O M P A S S " for the hero title.
fn spaced(title: &str) -> String {
    let mut out = String::with_capacity(title.len() * 2);
    for (i, c) in title.to_uppercase().chars().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

impl Header {
    pub fn draw(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        if area.height == 0 {
            return;
        }
        let title_style = Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD);
        let subtitle_style = Style::default()
            .fg(C_SECONDARY)
            .add_modifier(Modifier::ITALIC);

        // Badge always sits in the top-right corner.
        let badge_line = Line::from(badge(state)).right_aligned();
        frame.render_widget(Paragraph::new(badge_line), Rect { height: 1, ..area });

        if area.height >= HERO_HEIGHT {
            let lines = vec![
                Line::from(""),
                Line::from(""),
                Line::from(Span::styled(spaced(TITLE), title_style)),
                Line::from(""),
                Line::from(Span::styled(SUBTITLE, subtitle_style)),
            ];
            frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
        } else {
            let line = Line::from(vec![
                Span::styled(format!(" {}", TITLE), title_style),
                Span::styled("  ·  ", Style::default().fg(C_MUTED)),
                Span::styled(SUBTITLE, subtitle_style),
            ]);
            let width = area.width.saturating_sub(12);
            frame.render_widget(Paragraph::new(line), Rect { width, height: 1, ..area });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_proto::protocol::AnalyzeResponse;

    #[test]
    fn test_hero_only_while_initial() {
        let mut state = AppState::new("http://127.0.0.1:8000/analyze");
        assert_eq!(Header::height(&state), HERO_HEIGHT);

        let t = state.search.submit("Sade").unwrap();
        assert_eq!(Header::height(&state), COMPACT_HEIGHT);

        state.search.resolve(
            t.seq,
            Ok(AnalyzeResponse {
                tags: vec!["quiet storm".into()],
                recommendations: vec![],
            }),
        );
        assert_eq!(Header::height(&state), COMPACT_HEIGHT);
    }

    fn render(state: &AppState, width: u16, height: u16) -> Vec<String> {
        use ratatui::{backend::TestBackend, Terminal};
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| Header::new().draw(f, f.area(), state))
            .unwrap();
        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_draws_hero_and_badge() {
        let mut state = AppState::new("http://127.0.0.1:8000/analyze");
        state.health = BackendHealth::Offline;
        let rows = render(&state, 60, HERO_HEIGHT);
        assert!(rows[0].trim_end().ends_with("OFFLINE"));
        assert!(rows.iter().any(|r| r.contains("S O N I C")));
        assert!(rows.iter().any(|r| r.contains(SUBTITLE)));
    }

    #[test]
    fn test_spaced_title() {
        assert_eq!(spaced("Sonic"), "S O N I C");
    }
}
