use crate::address::{compose_url, Tokens};
use crate::discovery::{self, PROBE_HOST};
use crate::endpoints::{
    HelperEndpoints, CSRF_PATH, DEFAULT_PORT_RANGE, PAUSE_PATH, PLAY_PATH, STATUS_PATH,
    TRACK_URI_SCHEME,
};
use crate::error::{AuthError, RequestError, WebHelperError, WebHelperResult};
use crate::mapping::{
    map_controls, map_info, map_status, volume_percent, EnabledControls, HelperInfo,
    PlaybackStatus,
};
use crate::models::{CsrfTokenResponse, OAuthTokenResponse, RawStatus};
use crate::process::{
    HelperBinary, LaunchError, Liveness, PortProbeInspector, ProcessInspector, ProcessLauncher,
};
use crate::transport::{ReqwestTransport, Transport, TransportResponse};
use spotremote_core::redact::redact_secrets;
use spotremote_core::WebHelperConfig;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

/// A bootstrapped connection: port plus both tokens.
#[derive(Debug, Clone)]
struct Session {
    port: u16,
    oauth_token: String,
    csrf_token: String,
    connection_url: String,
}

impl Session {
    fn tokens(&self) -> Tokens<'_> {
        Tokens {
            csrf: &self.csrf_token,
            oauth: &self.oauth_token,
        }
    }
}

/// Client for the player's local helper daemon.
///
/// Nothing but [`WebHelper::connect`] works until a connect succeeds; every
/// other operation fails with [`WebHelperError::NotConnected`] without
/// touching the network. One high-level operation at a time is expected.
pub struct WebHelper {
    config: WebHelperConfig,
    endpoints: HelperEndpoints,
    transport: Arc<dyn Transport>,
    inspector: Arc<dyn ProcessInspector>,
    launcher: Option<Arc<dyn ProcessLauncher>>,
    session: RwLock<Option<Session>>,
}

pub struct WebHelperBuilder {
    config: WebHelperConfig,
    endpoints: HelperEndpoints,
    transport: Option<Arc<dyn Transport>>,
    inspector: Option<Arc<dyn ProcessInspector>>,
    launcher: Option<Arc<dyn ProcessLauncher>>,
}

impl WebHelperBuilder {
    pub fn endpoints(mut self, endpoints: HelperEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn inspector(mut self, inspector: impl ProcessInspector + 'static) -> Self {
        self.inspector = Some(Arc::new(inspector));
        self
    }

    pub fn launcher(mut self, launcher: impl ProcessLauncher + 'static) -> Self {
        self.launcher = Some(Arc::new(launcher));
        self
    }

    /// Fills unset collaborators: reqwest transport, port-probe liveness and
    /// the configured or conventional helper binary.
    pub fn build(self) -> WebHelperResult<WebHelper> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::new(self.config.accept_invalid_certs).map_err(|e| {
                    WebHelperError::Client {
                        message: e.to_string(),
                    }
                })?,
            ),
        };
        let inspector = self.inspector.unwrap_or_else(|| {
            Arc::new(PortProbeInspector::new(
                PROBE_HOST,
                port_range(&self.config),
                self.config.probe_timeout(),
            )) as Arc<dyn ProcessInspector>
        });
        let launcher = self.launcher.or_else(|| {
            self.config
                .helper_path
                .clone()
                .map(HelperBinary::new)
                .or_else(HelperBinary::default_location)
                .map(|binary| Arc::new(binary) as Arc<dyn ProcessLauncher>)
        });

        Ok(WebHelper {
            config: self.config,
            endpoints: self.endpoints,
            transport,
            inspector,
            launcher,
            session: RwLock::new(None),
        })
    }
}

fn port_range(config: &WebHelperConfig) -> RangeInclusive<u16> {
    match config.port {
        Some(port) => port..=port,
        None => DEFAULT_PORT_RANGE,
    }
}

fn is_track_uri(uri: &str) -> bool {
    uri.to_ascii_lowercase().contains(TRACK_URI_SCHEME)
}

/// `m:ss`, the offset notation the helper understands after `#`.
pub fn format_offset(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

impl WebHelper {
    pub fn new(config: WebHelperConfig) -> WebHelperResult<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: WebHelperConfig) -> WebHelperBuilder {
        WebHelperBuilder {
            config,
            endpoints: HelperEndpoints::default(),
            transport: None,
            inspector: None,
            launcher: None,
        }
    }

    /// Ports scanned during discovery; a configured port narrows it to one.
    pub fn port_range(&self) -> RangeInclusive<u16> {
        port_range(&self.config)
    }

    pub async fn is_connected(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn connection_url(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.connection_url.clone())
    }

    /// Discover the helper, fetch both tokens and store the session.
    ///
    /// Any previous session is dropped first. When the helper is not running
    /// and `auto_start` is set, it is launched once and checked again after
    /// the configured start delay. On failure the client stays disconnected.
    pub async fn connect(&self, auto_start: bool) -> WebHelperResult<String> {
        *self.session.write().await = None;

        let mut launched = false;
        loop {
            match self.inspector.liveness().await {
                Liveness::Running => break,
                Liveness::NotRunning if auto_start && !launched => {
                    self.launch().await;
                    launched = true;
                }
                Liveness::NotRunning => return Err(WebHelperError::DaemonNotRunning),
                Liveness::Unknown => {
                    if auto_start && !launched {
                        self.launch().await;
                    }
                    break;
                }
            }
        }

        let session = self.bootstrap().await?;
        let url = session.connection_url.clone();
        tracing::info!(port = session.port, "connected to helper");
        *self.session.write().await = Some(session);
        Ok(url)
    }

    async fn launch(&self) {
        let started = match &self.launcher {
            Some(launcher) => match launcher.start().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("could not start helper: {e}");
                    false
                }
            },
            None => {
                tracing::warn!("could not start helper: {}", LaunchError::NoLocation);
                false
            }
        };
        if started {
            tokio::time::sleep(self.config.start_delay()).await;
        }
    }

    async fn bootstrap(&self) -> WebHelperResult<Session> {
        let range = self.port_range();
        let (start, end) = (*range.start(), *range.end());
        let port = discovery::probe(PROBE_HOST, range, self.config.probe_timeout())
            .await
            .map_err(|_| WebHelperError::DaemonNotOpen { start, end })?;
        tracing::debug!(port, "helper port found");

        let oauth_token = self
            .fetch_oauth_token()
            .await
            .map_err(WebHelperError::AuthenticationFailed)?;
        let csrf_token = self
            .fetch_csrf_token(port)
            .await
            .map_err(WebHelperError::AuthenticationFailed)?;

        Ok(Session {
            port,
            oauth_token,
            csrf_token,
            connection_url: format!("{}://127.0.0.1:{}", self.endpoints.scheme, port),
        })
    }

    async fn fetch_oauth_token(&self) -> Result<String, AuthError> {
        const ENDPOINT: &str = "oauth token page";
        let url = Url::parse(&self.endpoints.oauth_url).map_err(|source| AuthError::Url {
            endpoint: ENDPOINT,
            source,
        })?;
        let resp = self
            .transport
            .get(&url, &[])
            .await
            .map_err(|source| AuthError::Transport {
                endpoint: ENDPOINT,
                source,
            })?;
        let body: OAuthTokenResponse = decode_token_body(ENDPOINT, &resp)?;
        non_empty(ENDPOINT, body.t, "missing \"t\"")
    }

    async fn fetch_csrf_token(&self, port: u16) -> Result<String, AuthError> {
        const ENDPOINT: &str = "helper csrf endpoint";
        let url = compose_url(&self.endpoints, port, None, CSRF_PATH, &[]).map_err(|source| {
            AuthError::Url {
                endpoint: ENDPOINT,
                source,
            }
        })?;
        let resp = self
            .transport
            .get(&url, &self.endpoints.origin_header())
            .await
            .map_err(|source| AuthError::Transport {
                endpoint: ENDPOINT,
                source,
            })?;
        let body: CsrfTokenResponse = decode_token_body(ENDPOINT, &resp)?;
        non_empty(ENDPOINT, body.token, "missing \"token\"")
    }

    /// Request URL for a helper path with the session tokens (when connected)
    /// and `params` appended. Each call uses a new random subdomain.
    ///
    /// This does not require a session; operations check that themselves.
    pub async fn build_url(&self, path: &str, params: &[(&str, &str)]) -> WebHelperResult<Url> {
        let session = self.session.read().await;
        let port = session
            .as_ref()
            .map(|s| s.port)
            .unwrap_or_else(|| *self.port_range().start());
        Ok(compose_url(
            &self.endpoints,
            port,
            session.as_ref().map(Session::tokens),
            path,
            params,
        )?)
    }

    async fn session(&self) -> WebHelperResult<Session> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(WebHelperError::NotConnected)
    }

    async fn send(
        &self,
        session: &Session,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<TransportResponse, RequestError> {
        let url = compose_url(
            &self.endpoints,
            session.port,
            Some(session.tokens()),
            path,
            params,
        )?;
        tracing::debug!(url = %redact_secrets(url.as_str()), "helper request");
        Ok(self
            .transport
            .get(&url, &self.endpoints.origin_header())
            .await?)
    }

    /// Unprocessed `/remote/status.json` payload.
    pub async fn raw_status(&self) -> WebHelperResult<RawStatus> {
        let session = self.session().await?;
        let resp = self
            .send(&session, STATUS_PATH, &[])
            .await
            .map_err(WebHelperError::StatusRequestFailed)?;
        if !resp.is_success() {
            return Err(WebHelperError::StatusRequestFailed(RequestError::Status {
                status: resp.status,
            }));
        }
        serde_json::from_str(&resp.body)
            .map_err(|e| WebHelperError::StatusRequestFailed(RequestError::Decode(e)))
    }

    /// Normalized status; pass `raw` to reuse a payload already in hand.
    pub async fn status(&self, raw: Option<RawStatus>) -> WebHelperResult<PlaybackStatus> {
        let raw = match raw {
            Some(raw) => {
                self.session().await?;
                raw
            }
            None => self.raw_status().await?,
        };
        if let Some(message) = raw.error_message() {
            return Err(WebHelperError::DaemonError { message });
        }
        map_status(&raw)
    }

    /// Pause (`true`) or resume (`false`) playback.
    pub async fn pause(&self, state: bool) -> WebHelperResult<PlaybackStatus> {
        let session = self.session().await?;
        let pause = if state { "true" } else { "false" };
        self.control(&session, PAUSE_PATH, &[("pause", pause)]).await
    }

    pub async fn unpause(&self) -> WebHelperResult<PlaybackStatus> {
        self.pause(false).await
    }

    /// Play a track URI, optionally scoped to a playlist/album `context`.
    ///
    /// Without a URI this resumes playback. URIs that do not contain
    /// `spotify:track` are rejected before any request is made.
    pub async fn play(
        &self,
        uri: Option<&str>,
        context: Option<&str>,
    ) -> WebHelperResult<PlaybackStatus> {
        let session = self.session().await?;
        let Some(uri) = uri else {
            return self.unpause().await;
        };
        if !is_track_uri(uri) {
            return Err(WebHelperError::InvalidUri {
                uri: uri.to_string(),
            });
        }
        self.control(
            &session,
            PLAY_PATH,
            &[("uri", uri), ("context", context.unwrap_or(""))],
        )
        .await
    }

    /// Restart the current track at `offset_seconds`.
    ///
    /// The offset travels as a `#m:ss` suffix on the track URI. Many helper
    /// versions ignore it, so playback may simply restart from the beginning
    /// or continue where it was.
    pub async fn seek(&self, offset_seconds: u64) -> WebHelperResult<()> {
        self.session().await?;
        if self.config.warnings {
            tracing::warn!("seek is rarely honoured by the helper; the offset may be ignored");
        }
        let current = self
            .status(None)
            .await?
            .current
            .ok_or(WebHelperError::NothingPlaying)?;
        let uri = format!("{}#{}", current.track.uri, format_offset(offset_seconds));
        self.play(Some(&uri), None).await?;
        Ok(())
    }

    async fn control(
        &self,
        session: &Session,
        path: &str,
        params: &[(&str, &str)],
    ) -> WebHelperResult<PlaybackStatus> {
        let resp = self
            .send(session, path, params)
            .await
            .map_err(WebHelperError::ControlRequestFailed)?;
        let parsed = serde_json::from_str::<RawStatus>(&resp.body);
        if let Some(message) = parsed.as_ref().ok().and_then(RawStatus::error_message) {
            return Err(WebHelperError::DaemonError { message });
        }
        if !resp.is_success() {
            return Err(WebHelperError::ControlRequestFailed(RequestError::Status {
                status: resp.status,
            }));
        }
        let raw =
            parsed.map_err(|e| WebHelperError::ControlRequestFailed(RequestError::Decode(e)))?;
        map_status(&raw)
    }

    /// Raw status for the projections below; a payload carrying an `error`
    /// object is a [`WebHelperError::DaemonError`], not a default reading.
    async fn checked_status(&self) -> WebHelperResult<RawStatus> {
        let raw = self.raw_status().await?;
        match raw.error_message() {
            Some(message) => Err(WebHelperError::DaemonError { message }),
            None => Ok(raw),
        }
    }

    pub async fn is_playing(&self) -> WebHelperResult<bool> {
        Ok(self.checked_status().await?.playing.unwrap_or(false))
    }

    pub async fn is_shuffle(&self) -> WebHelperResult<bool> {
        Ok(self.checked_status().await?.shuffle.unwrap_or(false))
    }

    pub async fn is_repeat(&self) -> WebHelperResult<bool> {
        Ok(self.checked_status().await?.repeat.unwrap_or(false))
    }

    /// Volume in percent.
    pub async fn volume(&self) -> WebHelperResult<u8> {
        Ok(volume_percent(self.checked_status().await?.volume))
    }

    pub async fn information(&self) -> WebHelperResult<HelperInfo> {
        Ok(map_info(&self.checked_status().await?))
    }

    pub async fn is_enabled(&self) -> WebHelperResult<EnabledControls> {
        Ok(map_controls(&self.checked_status().await?))
    }
}

fn decode_token_body<T: serde::de::DeserializeOwned>(
    endpoint: &'static str,
    resp: &TransportResponse,
) -> Result<T, AuthError> {
    if !resp.is_success() {
        return Err(AuthError::Status {
            endpoint,
            status: resp.status,
        });
    }
    tracing::trace!(endpoint, body = %redact_secrets(&resp.body), "token response");
    serde_json::from_str(&resp.body).map_err(|e| AuthError::MissingToken {
        endpoint,
        reason: e.to_string(),
    })
}

fn non_empty(
    endpoint: &'static str,
    token: Option<String>,
    reason: &str,
) -> Result<String, AuthError> {
    token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::MissingToken {
            endpoint,
            reason: reason.to_string(),
        })
}
