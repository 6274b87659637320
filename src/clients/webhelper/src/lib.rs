//! Remote control for the desktop player through its local helper daemon.
//!
//! The helper is an undocumented HTTP service bound somewhere in
//! [`DEFAULT_PORT_RANGE`] on localhost. Talking to it takes two tokens: an
//! OAuth-like token from the vendor's public token page and a CSRF token from
//! the helper itself. [`WebHelper::connect`] performs that handshake; the
//! control and query methods then normalize the helper's JSON into
//! [`PlaybackStatus`].
//!
//! ```no_run
//! # async fn demo() -> Result<(), webhelper::WebHelperError> {
//! use spotremote_core::WebHelperConfig;
//! use webhelper::WebHelper;
//!
//! let helper = WebHelper::new(WebHelperConfig::default())?;
//! helper.connect(true).await?;
//! helper.play(Some("spotify:track:5bcTCxgc7xVfSaMV3RuVke"), None).await?;
//! let status = helper.pause(true).await?;
//! assert!(!status.playing);
//! # Ok(())
//! # }
//! ```

mod address;
pub mod discovery;
pub mod endpoints;
mod error;
mod mapping;
pub mod models;
pub mod process;
mod session;
pub mod transport;

pub use address::{compose_url, random_label, Tokens};
pub use endpoints::{HelperEndpoints, DEFAULT_PORT_RANGE};
pub use error::{AuthError, RequestError, WebHelperError, WebHelperResult};
pub use mapping::{map_status, EnabledControls, HelperInfo, NowPlaying, PlaybackStatus, Resource};
pub use models::RawStatus;
pub use process::{Liveness, ProcessInspector, ProcessLauncher};
pub use session::{format_offset, WebHelper, WebHelperBuilder};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportResponse};
