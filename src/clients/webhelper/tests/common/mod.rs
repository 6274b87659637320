#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use spotremote_core::WebHelperConfig;
use std::collections::VecDeque;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;
use webhelper::{
    Liveness, ProcessInspector, ProcessLauncher, Transport, TransportError, TransportResponse,
};

pub const OAUTH_TOKEN: &str = "NQ-oauth-token";
pub const CSRF_TOKEN: &str = "c5rf-token";
pub const ORIGIN: &str = "https://open.spotify.com";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl Recorded {
    pub fn param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
pub struct HelperState {
    pub playing: bool,
    pub track_uri: Option<String>,
    pub oauth_status: u16,
    pub pause_error: bool,
    pub play_error: bool,
    /// Status code for pause/play responses that fail at the HTTP level.
    pub control_failure: Option<u16>,
    pub tokens_valid: bool,
}

impl Default for HelperState {
    fn default() -> Self {
        Self {
            playing: false,
            track_uri: None,
            oauth_status: 200,
            pause_error: false,
            play_error: false,
            control_failure: None,
            tokens_valid: true,
        }
    }
}

/// In-memory stand-in for the helper daemon and the token page.
#[derive(Clone, Default)]
pub struct FakeHelper {
    pub state: Arc<Mutex<HelperState>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeHelper {
    pub fn with_track(uri: &str) -> Self {
        let helper = Self::default();
        helper.state.lock().unwrap().track_uri = Some(uri.to_string());
        helper
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("at least one request")
    }

    fn status_body(state: &HelperState) -> Value {
        let mut body = json!({
            "version": 9,
            "client_version": "1.0.64.407",
            "playing": state.playing,
            "shuffle": true,
            "repeat": false,
            "play_enabled": true,
            "prev_enabled": false,
            "next_enabled": true,
            "volume": 0.5,
            "playing_position": 12.0
        });
        if let Some(uri) = &state.track_uri {
            body["track"] = json!({
                "track_resource": {
                    "name": "Feels",
                    "uri": uri,
                    "location": {"og": "https://open.spotify.com/track/feels"}
                },
                "artist_resource": {
                    "name": "Calvin Harris",
                    "uri": "spotify:artist:7CajNmpbOovFoOoasH2HaY",
                    "location": {"og": "https://open.spotify.com/artist/calvin"}
                },
                "album_resource": {
                    "name": "Funk Wav Bounces Vol. 1",
                    "uri": "spotify:album:2XpmA5EtH1bqBbnXjHuFR3",
                    "location": {"og": "https://open.spotify.com/album/funk"}
                }
            });
        }
        body
    }

    fn respond(&self, recorded: &Recorded) -> TransportResponse {
        let mut state = self.state.lock().unwrap();

        if recorded.url.path() == "/token" {
            return TransportResponse {
                status: state.oauth_status,
                body: json!({ "t": OAUTH_TOKEN }).to_string(),
            };
        }

        if recorded.header("Origin") != Some(ORIGIN) {
            return TransportResponse {
                status: 403,
                body: "missing origin".into(),
            };
        }

        if recorded.url.path() == "/simplecsrf/token.json" {
            return TransportResponse::ok(json!({ "token": CSRF_TOKEN }).to_string());
        }

        let authorized = state.tokens_valid
            && recorded.param("csrf").as_deref() == Some(CSRF_TOKEN)
            && recorded.param("oauth").as_deref() == Some(OAUTH_TOKEN);
        if !authorized {
            return TransportResponse::ok(
                json!({"error": {"type": "4107", "message": "Invalid Csrf token"}}).to_string(),
            );
        }

        let is_control = matches!(
            recorded.url.path(),
            "/remote/pause.json" | "/remote/play.json"
        );
        if let (true, Some(status)) = (is_control, state.control_failure) {
            return TransportResponse {
                status,
                body: "helper unavailable".into(),
            };
        }

        match recorded.url.path() {
            "/remote/status.json" => {}
            "/remote/pause.json" => {
                if state.pause_error {
                    return TransportResponse::ok(
                        json!({"error": {"type": "4303", "message": "Pause rejected"}})
                            .to_string(),
                    );
                }
                state.playing = recorded.param("pause").as_deref() != Some("true");
            }
            "/remote/play.json" => {
                if state.play_error {
                    return TransportResponse::ok(
                        json!({"error": {"type": "4303", "message": "Track unavailable"}})
                            .to_string(),
                    );
                }
                let uri = recorded.param("uri").unwrap_or_default();
                let bare = uri.split('#').next().unwrap_or_default().to_string();
                state.track_uri = Some(bare);
                state.playing = true;
            }
            _ => {
                return TransportResponse {
                    status: 404,
                    body: "not found".into(),
                }
            }
        }
        TransportResponse::ok(Self::status_body(&state).to_string())
    }
}

#[async_trait]
impl Transport for FakeHelper {
    async fn get(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        let recorded = Recorded {
            url: url.clone(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        };
        self.requests.lock().unwrap().push(recorded.clone());
        Ok(self.respond(&recorded))
    }
}

/// Answers liveness checks from a script; the last answer repeats.
#[derive(Clone)]
pub struct ScriptedInspector {
    answers: Arc<Mutex<VecDeque<Liveness>>>,
}

impl ScriptedInspector {
    pub fn new(answers: &[Liveness]) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.iter().copied().collect())),
        }
    }

    pub fn running() -> Self {
        Self::new(&[Liveness::Running])
    }
}

#[async_trait]
impl ProcessInspector for ScriptedInspector {
    async fn liveness(&self) -> Liveness {
        let mut answers = self.answers.lock().unwrap();
        if answers.len() > 1 {
            answers.pop_front().unwrap_or(Liveness::Unknown)
        } else {
            answers.front().copied().unwrap_or(Liveness::Unknown)
        }
    }
}

#[derive(Clone, Default)]
pub struct CountingLauncher {
    starts: Arc<AtomicUsize>,
}

impl CountingLauncher {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessLauncher for CountingLauncher {
    async fn start(&self) -> Result<(), webhelper::process::LaunchError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A listener standing in for the helper's socket; keep it alive while the
/// test runs.
pub fn helper_socket() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind helper socket");
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

pub fn config_for(port: u16) -> WebHelperConfig {
    WebHelperConfig {
        port: Some(port),
        start_delay_ms: 0,
        probe_timeout_ms: 200,
        ..WebHelperConfig::default()
    }
}
