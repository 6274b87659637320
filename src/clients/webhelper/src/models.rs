use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status payload as the helper returns it from `/remote/status.json` and the
/// control endpoints. Every field is optional; unknown fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_enabled: Option<bool>,
    /// 0.0 to 1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Seconds into the current track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playing_position: Option<f64>,
    /// Left untyped here; [`RawTrack`] validates it during normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl RawStatus {
    /// Human readable form of the payload's `error` field, if any.
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref().filter(|e| !e.is_null())?;
        let message = match error {
            Value::String(s) => s.clone(),
            Value::Object(obj) => obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| error.to_string()),
            other => other.to_string(),
        };
        Some(message)
    }
}

#[derive(Debug, Deserialize)]
pub struct RawTrack {
    pub track_resource: RawResource,
    pub artist_resource: RawResource,
    pub album_resource: RawResource,
}

#[derive(Debug, Deserialize)]
pub struct RawResource {
    pub name: String,
    pub uri: String,
    pub location: RawLocation,
}

#[derive(Debug, Deserialize)]
pub struct RawLocation {
    pub og: String,
}

/// Response of the OAuth bootstrap page.
#[derive(Debug, Deserialize)]
pub struct OAuthTokenResponse {
    pub t: Option<String>,
}

/// Response of the helper's `/simplecsrf/token.json`.
#[derive(Debug, Deserialize)]
pub struct CsrfTokenResponse {
    pub token: Option<String>,
}
