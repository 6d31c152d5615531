//! User-facing session error conditions.

use serde::Serialize;
use thiserror::Error;

use crate::sensors::{OrientationError, PositionError};

/// Conditions surfaced to the presentation layer through `SessionState::error`.
///
/// | Kind | Terminal | Blocking | Dismissible |
/// |------|----------|----------|-------------|
/// | `GeolocationUnsupported` | yes | yes | no |
/// | `GeolocationDenied` | yes | yes | no |
/// | `OrientationPermissionDenied` | no | no | yes |
/// | `OrientationUnavailable` | no | no | yes |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The platform has no location capability.
    #[error("Geolocation is not supported on this device.")]
    GeolocationUnsupported,

    /// Location access was refused.
    #[error("Location permission denied.")]
    GeolocationDenied,

    /// Orientation access was refused; the grant action may be retried.
    #[error("Compass permission denied. Allow access to see live alignment.")]
    OrientationPermissionDenied,

    /// No orientation sensor; only the bearing can be shown.
    #[error("Compass not available on this device. Showing the Qibla bearing only.")]
    OrientationUnavailable,
}

impl ErrorKind {
    /// Ends acquisition for the session; only a new session can retry.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ErrorKind::GeolocationUnsupported | ErrorKind::GeolocationDenied
        )
    }

    /// Prevents the main content from being shown.
    pub fn is_blocking(&self) -> bool {
        self.is_terminal()
    }

    /// May be cleared by the user.
    pub fn is_dismissible(&self) -> bool {
        !self.is_terminal()
    }

    /// The fixed message shown to the user.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<PositionError> for ErrorKind {
    fn from(e: PositionError) -> Self {
        match e {
            PositionError::PermissionDenied => ErrorKind::GeolocationDenied,
            PositionError::Unsupported => ErrorKind::GeolocationUnsupported,
        }
    }
}

impl From<OrientationError> for ErrorKind {
    fn from(e: OrientationError) -> Self {
        match e {
            OrientationError::Unavailable => ErrorKind::OrientationUnavailable,
        }
    }
}
