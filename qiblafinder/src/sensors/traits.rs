//! Sensor source traits.
//!
//! The session consumes two independent external sources:
//!
//! - A `PositionSource` that answers a one-shot position request.
//! - An `OrientationSource` that may require an explicit permission step and
//!   then streams heading samples until its subscription is cancelled.
//!
//! # Dyn Compatibility
//!
//! Async methods return `BoxFuture` so sources can be held as
//! `Arc<dyn PositionSource>` / `Arc<dyn OrientationSource>` and swapped for
//! simulated or test implementations.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::coord::GeoCoordinate;
use crate::heading::OrientationSample;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Buffer size for orientation sample channels.
///
/// Samples supersede each other, so a small buffer is enough; sources drop
/// samples rather than block when the session falls behind.
pub const ORIENTATION_CHANNEL_CAPACITY: usize = 16;

/// Options passed with every position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Ask the platform for its most accurate fix.
    pub enable_high_accuracy: bool,
}

impl PositionOptions {
    /// The fixed accuracy preference used by the session.
    pub const DEFAULT: PositionOptions = PositionOptions {
        enable_high_accuracy: true,
    };
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Why a position request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The user or platform refused access to location.
    #[error("Location permission denied")]
    PermissionDenied,

    /// The platform has no location capability.
    #[error("Geolocation is not supported")]
    Unsupported,
}

/// Answer to an orientation permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Orientation events may be delivered.
    Granted,
    /// The user refused; the request may be retried.
    Denied,
}

/// Why an orientation subscription could not be established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrientationError {
    /// The platform has no orientation sensor.
    #[error("Device orientation is not available")]
    Unavailable,
}

/// One-shot position provider.
pub trait PositionSource: Send + Sync {
    /// Request the current position.
    ///
    /// The returned future resolves exactly once. No timeout is applied by
    /// the caller; a source waiting on a permission prompt may take as long
    /// as the user does.
    fn request_position(
        &self,
        options: PositionOptions,
    ) -> BoxFuture<'_, Result<GeoCoordinate, PositionError>>;

    /// Short name for logging.
    fn name(&self) -> &str;
}

/// Continuous orientation provider.
pub trait OrientationSource: Send + Sync {
    /// Whether `request_permission` must succeed before `subscribe`.
    fn requires_permission(&self) -> bool;

    /// Ask the user for permission to read orientation.
    ///
    /// Sources that need no permission resolve to `Granted`.
    fn request_permission(&self) -> BoxFuture<'_, PermissionStatus>;

    /// Start delivering samples.
    ///
    /// The source must stop sending and release its listener once `cancel`
    /// is cancelled. Dropping the receiver has the same effect on the next
    /// send.
    ///
    /// # Errors
    ///
    /// Returns `OrientationError::Unavailable` if the platform has no
    /// orientation capability.
    fn subscribe(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<OrientationSample>, OrientationError>;

    /// Short name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_options_default_is_high_accuracy() {
        assert!(PositionOptions::default().enable_high_accuracy);
        assert_eq!(PositionOptions::default(), PositionOptions::DEFAULT);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PositionError::PermissionDenied.to_string(),
            "Location permission denied"
        );
        assert_eq!(
            OrientationError::Unavailable.to_string(),
            "Device orientation is not available"
        );
    }
}
