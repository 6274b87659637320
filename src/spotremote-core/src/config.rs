use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    /// Two-letter market code handed to web-API consumers (e.g. "US").
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub webhelper: WebHelperConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            market: None,
            logging: LoggingConfig::default(),
            webhelper: WebHelperConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    /// Mirror log events to stderr.
    #[serde(default = "default_true")]
    pub console: bool,
    /// Write a daily rolling log file under the data directory.
    #[serde(default = "default_true")]
    pub file: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            console: true,
            file: true,
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Settings for the local helper daemon session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebHelperConfig {
    /// Skip the port scan and only consider this port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Emit warnings for operations known to be unreliable (seek).
    #[serde(default = "default_true")]
    pub warnings: bool,
    /// Launch the helper binary when it is not running.
    #[serde(default = "default_true")]
    pub auto_start: bool,
    /// Time given to a freshly launched helper to bind its port.
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
    /// Per-port connect timeout used while scanning.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Overrides the platform install location of the helper binary.
    #[serde(default)]
    pub helper_path: Option<PathBuf>,
    /// The helper serves a self-signed certificate on some installs.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for WebHelperConfig {
    fn default() -> Self {
        Self {
            port: None,
            warnings: true,
            auto_start: true,
            start_delay_ms: default_start_delay_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            helper_path: None,
            accept_invalid_certs: false,
        }
    }
}

impl WebHelperConfig {
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("webhelper.port must be non-zero")]
    InvalidPort,
    #[error("market must be a two-letter country code, got {market:?}")]
    InvalidMarket { market: String },
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        config.market = config.market.map(|m| m.to_ascii_uppercase());
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        if self.webhelper.port == Some(0) {
            return Err(ValidationError::InvalidPort);
        }
        if let Some(market) = &self.market {
            if market.len() != 2 || !market.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ValidationError::InvalidMarket {
                    market: market.clone(),
                });
            }
        }
        Ok(())
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_max_log_files() -> usize {
    7
}

fn default_true() -> bool {
    true
}

fn default_start_delay_ms() -> u64 {
    1500
}

fn default_probe_timeout_ms() -> u64 {
    400
}
