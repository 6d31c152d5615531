//! Logging setup.
//!
//! Events are written to a log file through a non-blocking writer so the
//! terminal stays free for the session display. `RUST_LOG` overrides the
//! configured level when set.

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LoggingSettings, LOG_FILE_NAME};

/// Errors from installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("Failed to open log file {path}: {message}")]
    LogFile { path: PathBuf, message: String },

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level or filter directives, e.g. `info` or `qiblafinder=debug`.
    pub level: String,
    pub file: PathBuf,
}

impl LoggingConfig {
    pub fn new(level: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            level: level.into(),
            file: file.into(),
        }
    }

    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self::new(settings.level.clone(), settings.file_path())
    }
}

/// Keeps the background log writer alive; pending lines are flushed on drop.
#[must_use = "dropping the guard stops the log writer"]
pub struct LoggingGuard {
    _worker: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    /// File receiving log output.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = filter_directives(&config.level, env.as_deref());
    let filter = EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter {
        filter: directives.clone(),
        message: e.to_string(),
    })?;

    let (directory, file_name) = split_log_path(&config.file);
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&directory)
        .map_err(|e| LoggingError::LogFile {
            path: config.file.clone(),
            message: e.to_string(),
        })?;
    let (writer, worker) = tracing_appender::non_blocking(appender);

    // Local offset lookup fails once other threads exist; fall back to UTC.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_timer(OffsetTime::new(offset, Rfc3339));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        version = crate::VERSION,
        path = %config.file.display(),
        filter = %directives,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _worker: worker,
        path: config.file.clone(),
    })
}

/// `RUST_LOG` wins over the configured level when it is non-empty.
fn filter_directives(level: &str, env: Option<&str>) -> String {
    match env.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives.to_string(),
        _ => level.trim().to_string(),
    }
}

fn split_log_path(path: &Path) -> (PathBuf, String) {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| LOG_FILE_NAME.to_string());
    (directory, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_configured_level() {
        assert_eq!(filter_directives("info", None), "info");
        assert_eq!(filter_directives("info", Some("  ")), "info");
        assert_eq!(
            filter_directives("info", Some("qiblafinder=trace")),
            "qiblafinder=trace"
        );
    }

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/qiblafinder/app.log"));
        assert_eq!(dir, PathBuf::from("/var/log/qiblafinder"));
        assert_eq!(name, "app.log");

        let (dir, name) = split_log_path(Path::new("bare.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "bare.log");

        let (_, name) = split_log_path(Path::new("/"));
        assert_eq!(name, LOG_FILE_NAME);
    }

    #[test]
    fn test_config_from_settings() {
        let settings = LoggingSettings {
            level: "warn".to_string(),
            file: Some(PathBuf::from("/tmp/q.log")),
        };
        let config = LoggingConfig::from_settings(&settings);
        assert_eq!(config, LoggingConfig::new("warn", "/tmp/q.log"));
    }

    #[test]
    fn test_init_writes_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("test.log");

        let guard = init_logging(&LoggingConfig::new("info", &path)).unwrap();
        assert_eq!(guard.path(), path.as_path());
        tracing::warn!("file logging works");
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Logging initialized"));
        assert!(contents.contains("file logging works"));

        // A second global subscriber is refused
        let again = init_logging(&LoggingConfig::new("info", dir.path().join("other.log")));
        assert!(matches!(again, Err(LoggingError::AlreadyInitialized(_))));
    }
}
