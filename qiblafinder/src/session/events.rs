//! Messages into and effects out of the session state machine.
//!
//! Every asynchronous sensor callback and every user action is turned into a
//! `SessionEvent` and delivered through one channel, so the machine applies
//! them strictly one at a time. The machine answers with `SessionCommand`s
//! that the driver turns into sensor calls.

use crate::coord::GeoCoordinate;
use crate::heading::OrientationSample;
use crate::sensors::{PermissionStatus, PositionError};

/// Input to the session state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Session startup, after probing the orientation source.
    Started {
        /// Whether orientation needs an explicit grant on this platform.
        permission_required: bool,
    },
    /// The one-shot position request succeeded.
    PositionAcquired(GeoCoordinate),
    /// The one-shot position request failed.
    PositionFailed(PositionError),
    /// User action: grant orientation permission.
    PermissionRequested,
    /// The platform answered a permission request.
    PermissionResolved(PermissionStatus),
    /// A raw orientation reading arrived.
    OrientationSample(OrientationSample),
    /// The platform cannot deliver orientation.
    OrientationUnavailable,
    /// User action: dismiss the current non-terminal warning.
    DismissError,
    /// The session or its view is being torn down.
    Shutdown,
}

impl SessionEvent {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Started { .. } => "started",
            SessionEvent::PositionAcquired(_) => "position_acquired",
            SessionEvent::PositionFailed(_) => "position_failed",
            SessionEvent::PermissionRequested => "permission_requested",
            SessionEvent::PermissionResolved(_) => "permission_resolved",
            SessionEvent::OrientationSample(_) => "orientation_sample",
            SessionEvent::OrientationUnavailable => "orientation_unavailable",
            SessionEvent::DismissError => "dismiss_error",
            SessionEvent::Shutdown => "shutdown",
        }
    }
}

/// Effect requested by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Issue the one-shot position request.
    RequestPosition,
    /// Ask the orientation source for permission.
    RequestOrientationPermission,
    /// Register the orientation listener.
    StartOrientation,
    /// Release the orientation listener, if any.
    StopOrientation,
}
