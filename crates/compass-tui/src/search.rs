//! Search controller — the explicit phase machine behind the search screen.
//!
//! # Phases
//! ```text
//!  Idle                      — nothing searched yet (or search cancelled)
//!  Loading { seq }           — request `seq` is in flight
//!  Success { seq, .. }       — request `seq` answered with tags/recommendations
//!  Error { message }         — request failed; results cleared
//! ```
//!
//! Every submit bumps `seq`.  A resolution is applied only when it carries
//! the `seq` of the request currently loading, so a slow answer to an older
//! search can never overwrite a newer one.

use compass_proto::client::{ClientError, FETCH_ERROR_MESSAGE};
use compass_proto::protocol::{AnalyzeResponse, Recommendation};
use compass_proto::query;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Loading {
        seq: u64,
    },
    Success {
        seq: u64,
        tags: Vec<String>,
        recommendations: Vec<Recommendation>,
    },
    Error {
        message: String,
    },
}

impl SearchPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Self::Success { tags, .. } => tags,
            _ => &[],
        }
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        match self {
            Self::Success {
                recommendations, ..
            } => recommendations,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Nothing to show and nothing pending: the landing layout.
    pub fn is_initial(&self) -> bool {
        !self.is_loading() && self.tags().is_empty() && self.recommendations().is_empty()
    }

    /// The five starter suggestions are offered only on an empty, quiet
    /// screen without an error banner.
    pub fn shows_suggestions(&self) -> bool {
        self.is_initial() && self.error().is_none()
    }
}

/// What the caller needs to actually issue the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub artists: Vec<String>,
}

#[derive(Debug, Default)]
pub struct SearchController {
    phase: SearchPhase,
    last_seq: u64,
}

impl SearchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &SearchPhase {
        &self.phase
    }

    /// Start a search for `query`.  A blank query changes nothing and
    /// returns `None`; otherwise results and error are cleared, the phase
    /// becomes `Loading` and the returned ticket describes the request.
    pub fn submit(&mut self, query: &str) -> Option<SearchTicket> {
        if query::is_blank(query) {
            debug!("search: ignoring blank query");
            return None;
        }
        self.last_seq += 1;
        let ticket = SearchTicket {
            seq: self.last_seq,
            artists: query::split_terms(query),
        };
        info!("search #{}: {:?}", ticket.seq, ticket.artists);
        self.phase = SearchPhase::Loading { seq: ticket.seq };
        Some(ticket)
    }

    /// Apply the outcome of request `seq`.  Returns `false` (and changes
    /// nothing) when that request is no longer the one loading.
    pub fn resolve(&mut self, seq: u64, outcome: Result<AnalyzeResponse, ClientError>) -> bool {
        match self.phase {
            SearchPhase::Loading { seq: current } if current == seq => {}
            _ => {
                debug!("search #{}: stale resolution dropped", seq);
                return false;
            }
        }

        self.phase = match outcome {
            Ok(resp) => {
                info!(
                    "search #{}: {} tags, {} recommendations",
                    seq,
                    resp.tags.len(),
                    resp.recommendations.len()
                );
                SearchPhase::Success {
                    seq,
                    tags: resp.tags,
                    recommendations: resp.recommendations,
                }
            }
            Err(e) => {
                warn!("search #{} failed: {}", seq, e);
                SearchPhase::Error {
                    message: FETCH_ERROR_MESSAGE.to_string(),
                }
            }
        };
        true
    }

    /// Abandon the in-flight request and go back to the landing screen.
    /// Returns `true` if something was loading.
    pub fn cancel(&mut self) -> bool {
        if let SearchPhase::Loading { seq } = self.phase {
            info!("search #{}: cancelled", seq);
            self.phase = SearchPhase::Idle;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_error() -> ClientError {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        ClientError::Decode(err)
    }

    fn response(tags: &[&str], artists: &[&str]) -> AnalyzeResponse {
        AnalyzeResponse {
            tags: tags.iter().map(|s| s.to_string()).collect(),
            recommendations: artists
                .iter()
                .map(|a| Recommendation {
                    artist: a.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn test_blank_submit_is_a_noop() {
        let mut c = SearchController::new();
        assert!(c.submit("   ").is_none());
        assert_eq!(c.phase(), &SearchPhase::Idle);

        let t = c.submit("Grouper").unwrap();
        assert!(c.resolve(t.seq, Ok(response(&["ambient"], &["Liz Harris"]))));
        let before = c.phase().clone();
        assert!(c.submit("").is_none());
        assert_eq!(c.phase(), &before);
    }

    #[test]
    fn test_submit_clears_and_loads() {
        let mut c = SearchController::new();
        let t = c.submit("a, ,b,").unwrap();
        assert_eq!(t.artists, vec!["a", "b"]);
        assert!(c.phase().is_loading());
        assert!(c.phase().tags().is_empty());
        assert!(c.phase().recommendations().is_empty());
        assert!(c.phase().error().is_none());
    }

    #[test]
    fn test_tags_only_response() {
        let mut c = SearchController::new();
        let t = c.submit("Slowdive").unwrap();
        assert!(c.resolve(t.seq, Ok(response(&["Dreampop"], &[]))));
        assert_eq!(c.phase().tags().to_vec(), vec!["Dreampop"]);
        assert!(c.phase().recommendations().is_empty());
        assert!(!c.phase().is_loading());
        assert!(!c.phase().shows_suggestions());
    }

    #[test]
    fn test_failure_sets_generic_banner_and_clears_results() {
        let mut c = SearchController::new();
        let t = c.submit("x").unwrap();
        c.resolve(t.seq, Ok(response(&["t"], &["a"])));

        let t = c.submit("y").unwrap();
        assert!(c.resolve(t.seq, Err(decode_error())));
        assert_eq!(c.phase().error(), Some("Could not fetch recommendations."));
        assert!(c.phase().tags().is_empty());
        assert!(c.phase().recommendations().is_empty());
        assert!(!c.phase().is_loading());
    }

    #[test]
    fn test_only_latest_request_wins() {
        let mut c = SearchController::new();
        let first = c.submit("first").unwrap();
        let second = c.submit("second").unwrap();
        assert!(second.seq > first.seq);

        // Newer answer arrives first, then the stale one.
        assert!(c.resolve(second.seq, Ok(response(&["new"], &[]))));
        assert!(!c.resolve(first.seq, Ok(response(&["old"], &[]))));
        assert_eq!(c.phase().tags().to_vec(), vec!["new"]);

        // A stale failure is dropped just the same.
        let third = c.submit("third").unwrap();
        assert!(!c.resolve(second.seq, Err(decode_error())));
        assert_eq!(c.phase(), &SearchPhase::Loading { seq: third.seq });
    }

    #[test]
    fn test_suggestion_visibility() {
        let mut c = SearchController::new();
        assert!(c.phase().shows_suggestions());

        let t = c.submit("Darkwave").unwrap();
        assert!(!c.phase().shows_suggestions());

        c.resolve(t.seq, Ok(response(&["coldwave"], &["Lebanon Hanover"])));
        assert!(!c.phase().shows_suggestions());

        // Empty success: both lists empty again, suggestions come back.
        let t = c.submit("nothing").unwrap();
        c.resolve(t.seq, Ok(AnalyzeResponse::default()));
        assert!(c.phase().shows_suggestions());

        // Error banner hides them but still counts as the initial layout.
        let t = c.submit("boom").unwrap();
        c.resolve(t.seq, Err(decode_error()));
        assert!(c.phase().is_initial());
        assert!(!c.phase().shows_suggestions());
    }

    #[test]
    fn test_cancel_returns_to_idle_and_drops_late_answer() {
        let mut c = SearchController::new();
        assert!(!c.cancel());
        let t = c.submit("Japanese Jazz").unwrap();
        assert!(c.cancel());
        assert_eq!(c.phase(), &SearchPhase::Idle);
        assert!(!c.resolve(t.seq, Ok(response(&["late"], &[]))));
        assert_eq!(c.phase(), &SearchPhase::Idle);
    }
}
