//! Detecting and starting the helper process.

use crate::discovery;
use async_trait::async_trait;
use std::net::IpAddr;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;

#[cfg(windows)]
pub const HELPER_EXECUTABLE: &str = "SpotifyWebHelper.exe";
#[cfg(not(windows))]
pub const HELPER_EXECUTABLE: &str = "SpotifyWebHelper";

/// Best-effort answer to "is the helper running?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Running,
    NotRunning,
    /// The inspector cannot tell on this platform.
    Unknown,
}

#[async_trait]
pub trait ProcessInspector: Send + Sync {
    async fn liveness(&self) -> Liveness;
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no helper binary location is known for this platform")]
    NoLocation,
    #[error("failed to spawn helper at {path}: {source}")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn start(&self) -> Result<(), LaunchError>;
}

/// Treats any listener in the helper's port band as a running helper.
#[derive(Debug, Clone)]
pub struct PortProbeInspector {
    host: IpAddr,
    range: RangeInclusive<u16>,
    per_port_timeout: Duration,
}

impl PortProbeInspector {
    pub fn new(host: IpAddr, range: RangeInclusive<u16>, per_port_timeout: Duration) -> Self {
        Self {
            host,
            range,
            per_port_timeout,
        }
    }
}

#[async_trait]
impl ProcessInspector for PortProbeInspector {
    async fn liveness(&self) -> Liveness {
        match discovery::probe(self.host, self.range.clone(), self.per_port_timeout).await {
            Ok(_) => Liveness::Running,
            Err(_) => Liveness::NotRunning,
        }
    }
}

/// Looks the helper up by executable name in the OS process table.
#[derive(Debug, Clone)]
pub struct ProcessTableInspector {
    executable: String,
}

impl ProcessTableInspector {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl Default for ProcessTableInspector {
    fn default() -> Self {
        Self::new(HELPER_EXECUTABLE)
    }
}

#[async_trait]
impl ProcessInspector for ProcessTableInspector {
    async fn liveness(&self) -> Liveness {
        let executable = self.executable.clone();
        let lookup = tokio::task::spawn_blocking(move || {
            let mut system = sysinfo::System::new();
            system.refresh_processes();
            system
                .processes()
                .values()
                .any(|process| process.name() == executable)
        })
        .await;

        match lookup {
            Ok(true) => Liveness::Running,
            Ok(false) => Liveness::NotRunning,
            Err(e) => {
                tracing::debug!("process table lookup failed: {e}");
                Liveness::Unknown
            }
        }
    }
}

/// Inspector for platforms where the helper's presence cannot be checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

#[async_trait]
impl ProcessInspector for UnsupportedPlatform {
    async fn liveness(&self) -> Liveness {
        Liveness::Unknown
    }
}

/// Spawns the helper binary detached from the caller's stdio.
#[derive(Debug, Clone)]
pub struct HelperBinary {
    path: PathBuf,
}

impl HelperBinary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The player's install convention, when this platform has one.
    pub fn default_location() -> Option<Self> {
        helper_install_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProcessLauncher for HelperBinary {
    async fn start(&self) -> Result<(), LaunchError> {
        tracing::info!("starting helper at {}", self.path.display());
        tokio::process::Command::new(&self.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_child| ())
            .map_err(|source| LaunchError::Spawn {
                path: self.path.clone(),
                source,
            })
    }
}

/// `%APPDATA%\Spotify` on Windows, `~/Library/Application Support/Spotify` on
/// macOS.
#[cfg(any(windows, target_os = "macos"))]
pub fn helper_install_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.data_dir().join("Spotify").join(HELPER_EXECUTABLE))
}

#[cfg(not(any(windows, target_os = "macos")))]
pub fn helper_install_path() -> Option<PathBuf> {
    None
}
