//! CLI error type.

use thiserror::Error;

use qiblafinder::config::ConfigError;
use qiblafinder::coord::CoordError;
use qiblafinder::logging::LoggingError;
use qiblafinder::session::ErrorKind;

/// Errors reported by CLI commands. Every variant exits with status 1.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("Invalid coordinate: {0}")]
    Coordinate(#[from] CoordError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("{0}")]
    Location(ErrorKind),

    #[error("Failed to start runtime: {0}")]
    Runtime(std::io::Error),

    #[error("Failed to set signal handler: {0}")]
    Signal(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to encode snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
