//! Session phases, the owned state envelope and its published snapshot.

use std::fmt;

use serde::Serialize;

use super::error::ErrorKind;
use crate::alignment::AlignmentResult;
use crate::bearing::Bearing;
use crate::coord::GeoCoordinate;
use crate::heading::{Heading, HeadingSource};

/// Where the session is in its acquisition sequence.
///
/// ```text
/// Init ──► AcquiringLocation ──┬──► LocationError (terminal)
///                              ├──► AwaitingOrientationPermission ──► Tracking
///                              └──► Tracking
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Not started.
    #[default]
    Init,
    /// Waiting for the one-shot position fix.
    AcquiringLocation,
    /// Position failed; nothing more happens this session.
    LocationError,
    /// Bearing known; waiting for the user to grant orientation access.
    AwaitingOrientationPermission,
    /// Steady state; heading samples update the alignment.
    Tracking,
}

impl SessionPhase {
    /// Human-readable description for logging/UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Init => "init",
            SessionPhase::AcquiringLocation => "acquiring location",
            SessionPhase::LocationError => "location error",
            SessionPhase::AwaitingOrientationPermission => "awaiting orientation permission",
            SessionPhase::Tracking => "tracking",
        }
    }

    /// Whether no further transitions can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::LocationError)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The mutable envelope owned by the session state machine.
///
/// Fields are private; other components read them through accessors or a
/// `SessionSnapshot` copy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub(super) phase: SessionPhase,
    pub(super) position: Option<GeoCoordinate>,
    pub(super) bearing: Option<Bearing>,
    pub(super) heading: Heading,
    pub(super) heading_source: Option<HeadingSource>,
    pub(super) error: Option<ErrorKind>,
    pub(super) permission_granted: bool,
    pub(super) alignment: Option<AlignmentResult>,
}

impl SessionState {
    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Position fix, once acquired.
    pub fn position(&self) -> Option<GeoCoordinate> {
        self.position
    }

    /// Target bearing, cached once the position is known.
    pub fn bearing(&self) -> Option<Bearing> {
        self.bearing
    }

    /// Latest heading (north until a real sample arrives).
    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Whether a real heading has ever arrived.
    pub fn heading_received(&self) -> bool {
        self.heading_source.is_some()
    }

    /// Most recent error condition.
    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    /// Whether orientation access has been granted (explicitly or implicitly).
    pub fn permission_granted(&self) -> bool {
        self.permission_granted
    }

    /// Latest alignment; `None` until both bearing and a real heading exist.
    pub fn alignment(&self) -> Option<AlignmentResult> {
        self.alignment
    }
}

/// Point-in-time copy of the session published to the presentation layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionSnapshot {
    /// Monotonic update counter; increases on every state change.
    pub revision: u64,
    /// Current phase.
    pub phase: SessionPhase,
    /// Position fix, once acquired.
    pub position: Option<GeoCoordinate>,
    /// Target bearing.
    pub bearing: Option<Bearing>,
    /// Latest heading.
    pub heading: Heading,
    /// Convention of the latest real heading, `None` until one arrives.
    pub heading_source: Option<HeadingSource>,
    /// Most recent error condition.
    pub error: Option<ErrorKind>,
    /// Whether orientation access has been granted.
    pub permission_granted: bool,
    /// Latest alignment evaluation.
    pub alignment: Option<AlignmentResult>,
}

impl SessionSnapshot {
    /// Copy `state` into a snapshot tagged with `revision`.
    pub fn from_state(state: &SessionState, revision: u64) -> Self {
        Self {
            revision,
            phase: state.phase,
            position: state.position,
            bearing: state.bearing,
            heading: state.heading,
            heading_source: state.heading_source,
            error: state.error,
            permission_granted: state.permission_granted,
            alignment: state.alignment,
        }
    }

    /// Whether the device currently faces the target.
    ///
    /// Always false before a real heading has arrived.
    pub fn is_aligned(&self) -> bool {
        self.alignment.map(|a| a.is_aligned).unwrap_or(false)
    }

    /// Message for the current error, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.map(|e| e.message())
    }
}
