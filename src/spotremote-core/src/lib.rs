pub mod config;
pub mod logging;
pub mod paths;
pub mod redact;

pub use config::{Config, ConfigError, LogLevel, LoggingConfig, ValidationError, WebHelperConfig};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use paths::{AppDirs, DirsError};

pub const APP_NAME: &str = "spotremote";
pub const APP_AUTHOR: &str = "Spotremote";
pub const APP_QUALIFIER: &str = "io";
