use std::ops::RangeInclusive;

/// Ports the helper is known to bind.
pub const DEFAULT_PORT_RANGE: RangeInclusive<u16> = 4370..=4390;

pub const CSRF_PATH: &str = "/simplecsrf/token.json";
pub const STATUS_PATH: &str = "/remote/status.json";
pub const PAUSE_PATH: &str = "/remote/pause.json";
pub const PLAY_PATH: &str = "/remote/play.json";

/// Substring every playable track URI carries.
pub const TRACK_URI_SCHEME: &str = "spotify:track";

/// Where and how the helper and its token page are reached.
///
/// `Default` carries the vendor values; the helper rejects requests whose host
/// or `Origin` differ from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperEndpoints {
    pub scheme: String,
    /// Each request prepends a random label to this suffix.
    pub host_suffix: String,
    pub origin: String,
    pub oauth_url: String,
}

impl Default for HelperEndpoints {
    fn default() -> Self {
        Self {
            scheme: "https".into(),
            host_suffix: "spotilocal.com".into(),
            origin: "https://open.spotify.com".into(),
            oauth_url: "https://open.spotify.com/token".into(),
        }
    }
}

impl HelperEndpoints {
    pub fn origin_header(&self) -> [(&str, &str); 1] {
        [("Origin", self.origin.as_str())]
    }
}
