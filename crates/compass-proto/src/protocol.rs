use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Artwork shown for recommendations the backend could not find an image for.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/150/2a0a38/ffffff?text=?";

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyzeRequest {
    pub artists: Vec<String>,
}

/// Body returned by `POST /analyze`.
///
/// Both lists are optional on the wire.  An absent, `null` or malformed list
/// decodes as empty, and entries of the wrong shape are skipped, so one bad
/// field never fails the whole response.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AnalyzeResponse {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_recommendations")]
    pub recommendations: Vec<Recommendation>,
}

/// One recommended artist.  Every field but the name may be missing; a field
/// of the wrong type is treated as missing.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(default, deserialize_with = "lenient_name")]
    pub artist: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_fm_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub explanation: Option<String>,
    /// Preview audio.  A player is only offered when this is present.
    #[serde(default, deserialize_with = "lenient_string")]
    pub sample_url: Option<String>,
    /// Title of the preview track, when the backend found one.
    #[serde(default, deserialize_with = "lenient_string")]
    pub sample_track: Option<String>,
}

impl Recommendation {
    /// Image URL, or the placeholder artwork when none (or an empty one) was sent.
    pub fn image_or_placeholder(&self) -> &str {
        match self.image.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => PLACEHOLDER_IMAGE,
        }
    }

    /// Preview URL if it is usable.
    pub fn preview_url(&self) -> Option<&str> {
        non_empty(self.sample_url.as_deref())
    }

    pub fn explanation(&self) -> Option<&str> {
        non_empty(self.explanation.as_deref())
    }

    pub fn profile_url(&self) -> Option<&str> {
        non_empty(self.last_fm_url.as_deref())
    }
}

/// Reply of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct HealthResponse {
    #[serde(default)]
    pub ok: bool,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

/// Keeps the string entries of an array; anything else is empty.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Keeps the entries that are objects; anything else is skipped.
fn lenient_recommendations<'de, D>(deserializer: D) -> Result<Vec<Recommendation>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|v| Recommendation::deserialize(v).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let req = AnalyzeRequest {
            artists: vec!["Boards of Canada".into(), "Grouper".into()],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "artists": ["Boards of Canada", "Grouper"] })
        );
    }

    #[test]
    fn test_response_missing_lists_are_empty() {
        let resp: AnalyzeResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.tags.is_empty());
        assert!(resp.recommendations.is_empty());

        let resp: AnalyzeResponse =
            serde_json::from_str(r#"{"tags": null, "recommendations": null}"#).unwrap();
        assert_eq!(resp, AnalyzeResponse::default());
    }

    #[test]
    fn test_response_tags_only() {
        let resp: AnalyzeResponse =
            serde_json::from_str(r#"{"tags":["Dreampop"],"recommendations":[]}"#).unwrap();
        assert_eq!(resp.tags, vec!["Dreampop".to_string()]);
        assert!(resp.recommendations.is_empty());
    }

    #[test]
    fn test_recommendation_full_backend_shape() {
        let raw = r#"{
            "artist": "Hiroshi Yoshimura",
            "explanation": "Ambient minimalism in the same quiet register.",
            "tags": ["kankyo ongaku", "ambient", "minimal"],
            "image": "https://is1-ssl.mzstatic.com/image/400x400bb.jpg",
            "sampleUrl": "https://audio-ssl.itunes.apple.com/preview.m4a",
            "sampleTrack": "Blink",
            "lastFmUrl": "https://www.last.fm/music/Hiroshi+Yoshimura"
        }"#;
        let rec: Recommendation = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.artist, "Hiroshi Yoshimura");
        assert_eq!(rec.tags.len(), 3);
        assert_eq!(rec.sample_track.as_deref(), Some("Blink"));
        assert_eq!(
            rec.profile_url(),
            Some("https://www.last.fm/music/Hiroshi+Yoshimura")
        );
        assert_eq!(
            rec.image_or_placeholder(),
            "https://is1-ssl.mzstatic.com/image/400x400bb.jpg"
        );
    }

    #[test]
    fn test_recommendation_degrades_per_field() {
        let raw = r#"{"artist": "Nobody", "image": null, "sampleUrl": null, "tags": null}"#;
        let rec: Recommendation = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.image_or_placeholder(), PLACEHOLDER_IMAGE);
        assert!(rec.preview_url().is_none());
        assert!(rec.explanation().is_none());
        assert!(rec.tags.is_empty());

        let rec: Recommendation = serde_json::from_str(r#"{"image": ""}"#).unwrap();
        assert_eq!(rec.artist, "");
        assert_eq!(rec.image_or_placeholder(), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_malformed_fields_fall_back_to_missing() {
        let raw = r#"{"tags":["Dreampop", 7],"recommendations":[{"artist":"A","explanation":42,"image":123,"tags":"shoegaze","sampleUrl":["x"]}, "junk"]}"#;
        let resp: AnalyzeResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.tags, vec!["Dreampop".to_string()]);
        assert_eq!(resp.recommendations.len(), 1);

        let rec = &resp.recommendations[0];
        assert_eq!(rec.artist, "A");
        assert_eq!(rec.explanation, None);
        assert_eq!(rec.image, None);
        assert_eq!(rec.image_or_placeholder(), PLACEHOLDER_IMAGE);
        assert!(rec.tags.is_empty());
        assert!(rec.preview_url().is_none());
    }

    #[test]
    fn test_malformed_lists_decode_as_empty() {
        let resp: AnalyzeResponse =
            serde_json::from_str(r#"{"tags": "Dreampop", "recommendations": {"artist": "A"}}"#)
                .unwrap();
        assert_eq!(resp, AnalyzeResponse::default());
    }
}
