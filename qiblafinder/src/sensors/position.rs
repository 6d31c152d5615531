//! Position sources with a known answer.
//!
//! There is no portable geolocation API on the desktop, so the CLI seeds the
//! session with a manual position (from the command line or config file),
//! much like a user entering their city. `DeniedPositionSource` models the
//! failure categories.

use std::time::Duration;

use super::traits::{BoxFuture, PositionError, PositionOptions, PositionSource};
use crate::coord::GeoCoordinate;

/// Answers every request with the same coordinate, optionally after a delay.
#[derive(Debug, Clone)]
pub struct FixedPositionSource {
    coordinate: GeoCoordinate,
    delay: Duration,
}

impl FixedPositionSource {
    /// Create a source that resolves immediately.
    pub fn new(coordinate: GeoCoordinate) -> Self {
        Self {
            coordinate,
            delay: Duration::ZERO,
        }
    }

    /// Simulate time to first fix.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The coordinate this source reports.
    pub fn coordinate(&self) -> GeoCoordinate {
        self.coordinate
    }
}

impl PositionSource for FixedPositionSource {
    fn request_position(
        &self,
        options: PositionOptions,
    ) -> BoxFuture<'_, Result<GeoCoordinate, PositionError>> {
        Box::pin(async move {
            tracing::debug!(
                high_accuracy = options.enable_high_accuracy,
                delay_ms = self.delay.as_millis() as u64,
                "Fixed position requested"
            );
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.coordinate)
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Fails every request with the configured error.
#[derive(Debug, Clone, Copy)]
pub struct DeniedPositionSource {
    error: PositionError,
}

impl DeniedPositionSource {
    /// Source that reports `PermissionDenied`.
    pub fn permission_denied() -> Self {
        Self {
            error: PositionError::PermissionDenied,
        }
    }

    /// Source that reports `Unsupported`.
    pub fn unsupported() -> Self {
        Self {
            error: PositionError::Unsupported,
        }
    }
}

impl PositionSource for DeniedPositionSource {
    fn request_position(
        &self,
        _options: PositionOptions,
    ) -> BoxFuture<'_, Result<GeoCoordinate, PositionError>> {
        let error = self.error;
        Box::pin(async move { Err(error) })
    }

    fn name(&self) -> &str {
        "denied"
    }
}
