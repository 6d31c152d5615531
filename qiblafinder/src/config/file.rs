//! The configuration file and its typed sections.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;

use super::keys::ConfigKey;
use super::{config_file_path, default_log_path, ensure_parent, ConfigError};
use crate::coord::GeoCoordinate;
use crate::sensors::DEFAULT_SWEEP_RATE_DEG_PER_SEC;

/// Default orientation sample interval in milliseconds.
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;

/// Default logging level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Which orientation source the CLI uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrientationMode {
    /// Simulated device rotating at a fixed rate.
    #[default]
    Sweep,
    /// Samples read line by line from standard input.
    Stdin,
    /// No orientation capability.
    None,
}

impl OrientationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrientationMode::Sweep => "sweep",
            OrientationMode::Stdin => "stdin",
            OrientationMode::None => "none",
        }
    }
}

impl fmt::Display for OrientationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrientationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sweep" => Ok(OrientationMode::Sweep),
            "stdin" => Ok(OrientationMode::Stdin),
            "none" => Ok(OrientationMode::None),
            other => Err(format!(
                "unknown orientation mode '{}' (expected sweep, stdin or none)",
                other
            )),
        }
    }
}

/// `[location]` section: the manual position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocationSettings {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationSettings {
    /// The configured position, when both halves are set and valid.
    pub fn coordinate(&self) -> Option<GeoCoordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => GeoCoordinate::new(lat, lon).ok(),
            _ => None,
        }
    }
}

/// `[orientation]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationSettings {
    pub mode: OrientationMode,
    /// Whether the orientation source demands an explicit grant.
    pub require_permission: bool,
    /// Simulated rotation rate in degrees per second (sweep mode).
    pub sweep_rate: f64,
    /// Time between simulated samples.
    pub sample_interval_ms: u64,
}

impl OrientationSettings {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

impl Default for OrientationSettings {
    fn default() -> Self {
        Self {
            mode: OrientationMode::default(),
            require_permission: false,
            sweep_rate: DEFAULT_SWEEP_RATE_DEG_PER_SEC,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    /// Log file; `None` means the default under the config directory.
    pub file: Option<PathBuf>,
}

impl LoggingSettings {
    /// Log file to write, resolving the default.
    pub fn file_path(&self) -> PathBuf {
        self.file.clone().unwrap_or_else(default_log_path)
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

/// All persisted settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub location: LocationSettings,
    pub orientation: OrientationSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default path, or defaults if the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, or defaults if the file does not exist.
    ///
    /// Unknown sections and keys are ignored; known keys with invalid values
    /// are rejected.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Save to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories. Unset values are omitted.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        ensure_parent(path)?;

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }

        ini.write_to_file(path).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), "Saved config file");
        Ok(())
    }
}
