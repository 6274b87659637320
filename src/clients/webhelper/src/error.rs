use crate::transport::TransportError;
use thiserror::Error;

/// Failures surfaced by [`crate::WebHelper`] operations.
#[derive(Debug, Error)]
pub enum WebHelperError {
    #[error("not connected to the helper; call connect() first")]
    NotConnected,
    #[error("helper process is not running")]
    DaemonNotRunning,
    #[error("helper is not listening on any port in {start}..={end}")]
    DaemonNotOpen { start: u16, end: u16 },
    #[error("helper authentication failed: {0}")]
    AuthenticationFailed(#[source] AuthError),
    #[error("status request failed: {0}")]
    StatusRequestFailed(#[source] RequestError),
    #[error("control request failed: {0}")]
    ControlRequestFailed(#[source] RequestError),
    #[error("helper returned an error: {message}")]
    DaemonError { message: String },
    #[error("invalid track URI: {uri}")]
    InvalidUri { uri: String },
    #[error("malformed status payload: {reason}")]
    MalformedStatus { reason: String },
    #[error("no track is loaded in the player")]
    NothingPlaying,
    #[error("failed to build HTTP client: {message}")]
    Client { message: String },
    #[error("invalid helper URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Why the OAuth/CSRF handshake failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: TransportError,
    },
    #[error("invalid {endpoint} URL: {source}")]
    Url {
        endpoint: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{endpoint} answered with HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("{endpoint} response did not contain a token: {reason}")]
    MissingToken {
        endpoint: &'static str,
        reason: String,
    },
}

/// Transport or decoding failure of a helper request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("helper answered with HTTP {status}")]
    Status { status: u16 },
    #[error("response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type WebHelperResult<T> = Result<T, WebHelperError>;
