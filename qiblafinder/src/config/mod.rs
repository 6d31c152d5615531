//! Persistent configuration.
//!
//! Settings live in an INI file at `~/.qiblafinder/config.ini`:
//!
//! ```ini
//! [location]
//! latitude = 40.7128
//! longitude = -74.0060
//!
//! [orientation]
//! mode = sweep
//! require_permission = false
//! sweep_rate = 15
//! sample_interval_ms = 100
//!
//! [logging]
//! level = info
//! file = /var/log/qiblafinder.log
//! ```
//!
//! A missing file is not an error; every setting has a default. Individual
//! settings are addressed as `section.key` through [`ConfigKey`].

mod file;
mod keys;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use file::{
    ConfigFile, LocationSettings, LoggingSettings, OrientationMode, OrientationSettings,
    DEFAULT_LOG_LEVEL, DEFAULT_SAMPLE_INTERVAL_MS,
};
pub use keys::ConfigKey;

/// Name of the per-user configuration directory under the home directory.
pub const CONFIG_DIR_NAME: &str = ".qiblafinder";

/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// File name of the default log file.
pub const LOG_FILE_NAME: &str = "qiblafinder.log";

/// Errors from loading, saving or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Directory holding the configuration file and default log file.
///
/// Falls back to the working directory when no home directory is known.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Path of the default log file.
pub fn default_log_path() -> PathBuf {
    config_dir().join(LOG_FILE_NAME)
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
