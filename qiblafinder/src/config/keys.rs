//! Addressable configuration keys (`section.key`).

use std::path::PathBuf;
use std::str::FromStr;

use super::file::{ConfigFile, OrientationMode};
use super::ConfigError;
use crate::coord::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Every setting that can be read or written through `config get/set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    LocationLatitude,
    LocationLongitude,
    OrientationMode,
    OrientationRequirePermission,
    OrientationSweepRate,
    OrientationSampleIntervalMs,
    LoggingLevel,
    LoggingFile,
}

impl ConfigKey {
    /// All keys, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::LocationLatitude,
            ConfigKey::LocationLongitude,
            ConfigKey::OrientationMode,
            ConfigKey::OrientationRequirePermission,
            ConfigKey::OrientationSweepRate,
            ConfigKey::OrientationSampleIntervalMs,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingFile,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::LocationLatitude | ConfigKey::LocationLongitude => "location",
            ConfigKey::OrientationMode
            | ConfigKey::OrientationRequirePermission
            | ConfigKey::OrientationSweepRate
            | ConfigKey::OrientationSampleIntervalMs => "orientation",
            ConfigKey::LoggingLevel | ConfigKey::LoggingFile => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::LocationLatitude => "latitude",
            ConfigKey::LocationLongitude => "longitude",
            ConfigKey::OrientationMode => "mode",
            ConfigKey::OrientationRequirePermission => "require_permission",
            ConfigKey::OrientationSweepRate => "sweep_rate",
            ConfigKey::OrientationSampleIntervalMs => "sample_interval_ms",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingFile => "file",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as a string; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::LocationLatitude => optional(config.location.latitude),
            ConfigKey::LocationLongitude => optional(config.location.longitude),
            ConfigKey::OrientationMode => config.orientation.mode.to_string(),
            ConfigKey::OrientationRequirePermission => {
                config.orientation.require_permission.to_string()
            }
            ConfigKey::OrientationSweepRate => config.orientation.sweep_rate.to_string(),
            ConfigKey::OrientationSampleIntervalMs => {
                config.orientation.sample_interval_ms.to_string()
            }
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingFile => config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate and store `value`.
    ///
    /// An empty value clears optional settings.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let name = self.name();
        let trimmed = value.trim();

        match self {
            ConfigKey::LocationLatitude => {
                config.location.latitude = parse_degrees(&name, trimmed, MIN_LAT, MAX_LAT)?;
            }
            ConfigKey::LocationLongitude => {
                config.location.longitude = parse_degrees(&name, trimmed, MIN_LON, MAX_LON)?;
            }
            ConfigKey::OrientationMode => {
                config.orientation.mode = trimmed
                    .parse::<OrientationMode>()
                    .map_err(|reason| ConfigError::invalid(&name, value, reason))?;
            }
            ConfigKey::OrientationRequirePermission => {
                config.orientation.require_permission = parse_bool(&name, trimmed)?;
            }
            ConfigKey::OrientationSweepRate => {
                let rate: f64 = trimmed
                    .parse()
                    .map_err(|_| ConfigError::invalid(&name, value, "expected a number"))?;
                if !rate.is_finite() {
                    return Err(ConfigError::invalid(&name, value, "must be finite"));
                }
                config.orientation.sweep_rate = rate;
            }
            ConfigKey::OrientationSampleIntervalMs => {
                let ms: u64 = trimmed.parse().map_err(|_| {
                    ConfigError::invalid(&name, value, "expected a whole number of milliseconds")
                })?;
                if ms == 0 {
                    return Err(ConfigError::invalid(&name, value, "must be greater than 0"));
                }
                config.orientation.sample_interval_ms = ms;
            }
            ConfigKey::LoggingLevel => {
                let level = trimmed.to_ascii_lowercase();
                tracing::Level::from_str(&level).map_err(|_| {
                    ConfigError::invalid(
                        &name,
                        value,
                        "expected trace, debug, info, warn or error",
                    )
                })?;
                config.logging.level = level;
            }
            ConfigKey::LoggingFile => {
                config.logging.file = if trimmed.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(trimmed))
                };
            }
        }

        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_degrees(name: &str, value: &str, min: f64, max: f64) -> Result<Option<f64>, ConfigError> {
    if value.is_empty() {
        return Ok(None);
    }
    let degrees: f64 = value
        .parse()
        .map_err(|_| ConfigError::invalid(name, value, "expected a number of degrees"))?;
    if !(min..=max).contains(&degrees) {
        return Err(ConfigError::invalid(
            name,
            value,
            format!("must be between {} and {}", min, max),
        ));
    }
    Ok(Some(degrees))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::invalid(name, value, "expected true or false")),
    }
}
