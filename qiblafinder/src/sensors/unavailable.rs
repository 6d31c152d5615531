//! Orientation source for platforms without an orientation sensor.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::traits::{BoxFuture, OrientationError, OrientationSource, PermissionStatus};
use crate::heading::OrientationSample;

/// Always reports that orientation is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOrientationSource;

impl OrientationSource for NoOrientationSource {
    fn requires_permission(&self) -> bool {
        false
    }

    fn request_permission(&self) -> BoxFuture<'_, PermissionStatus> {
        Box::pin(async { PermissionStatus::Granted })
    }

    fn subscribe(
        &self,
        _cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<OrientationSample>, OrientationError> {
        Err(OrientationError::Unavailable)
    }

    fn name(&self) -> &str {
        "none"
    }
}
