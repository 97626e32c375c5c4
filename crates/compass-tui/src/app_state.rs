//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this, but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use crate::preview::PreviewPlayer;
use crate::search::{SearchController, SearchPhase};
use crate::widgets::status_bar::InputMode;

/// Result of the startup `/health` probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendHealth {
    #[default]
    Unknown,
    Online,
    Offline,
}

pub struct AppState {
    // ── Search ──────────────────────────────────────────────────────────────
    pub search: SearchController,
    /// One slot per recommendation card; `None` when the card has no preview.
    pub players: Vec<Option<PreviewPlayer>>,

    // ── Backend ─────────────────────────────────────────────────────────────
    pub health: BackendHealth,
    pub analyze_url: String,

    // ── UI mode ─────────────────────────────────────────────────────────────
    pub input_mode: InputMode,
}

impl AppState {
    pub fn new(analyze_url: impl Into<String>) -> Self {
        Self {
            search: SearchController::new(),
            players: Vec::new(),
            health: BackendHealth::Unknown,
            analyze_url: analyze_url.into(),
            input_mode: InputMode::Input,
        }
    }

    pub fn phase(&self) -> &SearchPhase {
        self.search.phase()
    }

    pub fn player(&self, card: usize) -> Option<&PreviewPlayer> {
        self.players.get(card).and_then(Option::as_ref)
    }

    /// Labels of the clickable tags above the cards: the result tags, or the
    /// starter suggestions on the landing screen.
    pub fn cloud_tags(&self) -> Vec<String> {
        let phase = self.phase();
        if phase.shows_suggestions() {
            compass_proto::query::SUGGESTIONS
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            phase.tags().to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_proto::protocol::{AnalyzeResponse, Recommendation};

    #[test]
    fn test_cloud_shows_suggestions_then_result_tags() {
        let mut state = AppState::new("http://127.0.0.1:8000/analyze");
        assert_eq!(state.cloud_tags().len(), 5);
        assert_eq!(state.cloud_tags()[0], "Japanese Jazz");

        let t = state.search.submit("Burial").unwrap();
        assert!(state.cloud_tags().is_empty());

        state.search.resolve(
            t.seq,
            Ok(AnalyzeResponse {
                tags: vec!["garage".into(), "2step".into()],
                recommendations: vec![Recommendation {
                    artist: "Zomby".into(),
                    ..Default::default()
                }],
            }),
        );
        assert_eq!(state.cloud_tags(), vec!["garage", "2step"]);
    }

    #[test]
    fn test_player_lookup_skips_cards_without_preview() {
        let mut state = AppState::new("http://127.0.0.1:8000/analyze");
        let recs = vec![
            Recommendation {
                artist: "a".into(),
                ..Default::default()
            },
            Recommendation {
                artist: "b".into(),
                sample_url: Some("https://example.test/b.m4a".into()),
                ..Default::default()
            },
        ];
        state.players = crate::preview::players_for(1, &recs);
        assert!(state.player(0).is_none());
        assert_eq!(state.player(1).map(|p| p.url()), Some("https://example.test/b.m4a"));
        assert!(state.player(7).is_none());
    }
}
