//! Session state machine.
//!
//! All session behaviour is a function of the current phase and an event.
//! The machine is synchronous and owns the `SessionState`; it never touches a
//! sensor directly. Side effects are returned as `SessionCommand`s.
//!
//! # Transition Table
//!
//! ```text
//! Init                           + Started               -> AcquiringLocation   [RequestPosition]
//! AcquiringLocation              + PositionFailed        -> LocationError       [StopOrientation]
//! AcquiringLocation              + PositionAcquired      -> AwaitingPermission  (permission required)
//!                                                        -> Tracking            [StartOrientation]
//! AwaitingPermission             + PermissionRequested   -> (same)              [RequestOrientationPermission]
//! AwaitingPermission             + PermissionResolved(✓) -> Tracking            [StartOrientation]
//! AwaitingPermission             + PermissionResolved(✗) -> (same, warning)
//! Tracking                       + OrientationSample     -> (same, heading/alignment updated)
//! Tracking                       + OrientationUnavailable-> (same, warning)     [StopOrientation]
//! any                            + DismissError          -> (same, non-terminal error cleared)
//! any                            + Shutdown              -> (same)              [StopOrientation]
//! ```
//!
//! Every other pairing is ignored. `LocationError` ignores everything except
//! `Shutdown`.

use super::error::ErrorKind;
use super::events::{SessionCommand, SessionEvent};
use super::state::{SessionPhase, SessionSnapshot, SessionState};
use crate::alignment;
use crate::bearing::qibla_bearing;
use crate::coord::GeoCoordinate;
use crate::heading::{self, OrientationSample};
use crate::sensors::{PermissionStatus, PositionError};

/// Drives a `SessionState` through the acquisition sequence.
#[derive(Debug, Default)]
pub struct SessionMachine {
    state: SessionState,
    /// Probed at startup; decides the post-position phase.
    permission_required: bool,
    /// A permission request is in flight.
    permission_pending: bool,
    /// Shutdown has been handled; every later event is ignored.
    closed: bool,
    /// Incremented on every state mutation.
    revision: u64,
}

impl SessionMachine {
    /// Create a machine in the `Init` phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the owned state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    /// Update counter, bumped whenever the state changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether `Shutdown` has been handled.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Copy of the current state for the presentation layer.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from_state(&self.state, self.revision)
    }

    /// Apply one event and return the effects it requires.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionCommand> {
        if self.closed {
            tracing::debug!(event = event.name(), "Session closed, ignoring event");
            return Vec::new();
        }

        match (self.state.phase, event) {
            (_, SessionEvent::Shutdown) => {
                self.closed = true;
                tracing::debug!(phase = %self.state.phase, "Session shutting down");
                vec![SessionCommand::StopOrientation]
            }

            (SessionPhase::Init, SessionEvent::Started { permission_required }) => {
                self.permission_required = permission_required;
                self.transition_to(SessionPhase::AcquiringLocation);
                tracing::debug!(permission_required, "Requesting position");
                vec![SessionCommand::RequestPosition]
            }

            (SessionPhase::AcquiringLocation, SessionEvent::PositionFailed(e)) => {
                self.on_position_failed(e)
            }
            (SessionPhase::AcquiringLocation, SessionEvent::PositionAcquired(coord)) => {
                self.on_position_acquired(coord)
            }

            (SessionPhase::AwaitingOrientationPermission, SessionEvent::PermissionRequested) => {
                if self.permission_pending {
                    tracing::debug!("Permission request already in flight");
                    return Vec::new();
                }
                self.permission_pending = true;
                vec![SessionCommand::RequestOrientationPermission]
            }
            (SessionPhase::AwaitingOrientationPermission, SessionEvent::PermissionResolved(status)) => {
                self.on_permission_resolved(status)
            }

            (SessionPhase::Tracking, SessionEvent::OrientationSample(sample)) => {
                self.on_orientation_sample(&sample);
                Vec::new()
            }
            (SessionPhase::Tracking, SessionEvent::OrientationUnavailable) => {
                tracing::warn!("Orientation unavailable, showing bearing only");
                self.set_error(Some(ErrorKind::OrientationUnavailable));
                vec![SessionCommand::StopOrientation]
            }

            (_, SessionEvent::DismissError) => {
                match self.state.error {
                    Some(error) if error.is_dismissible() => {
                        self.set_error(None);
                    }
                    _ => {}
                }
                Vec::new()
            }

            (phase, event) => {
                tracing::debug!(phase = %phase, event = event.name(), "Ignoring event");
                Vec::new()
            }
        }
    }

    fn on_position_failed(&mut self, e: PositionError) -> Vec<SessionCommand> {
        let error = ErrorKind::from(e);
        tracing::warn!(error = %error, "Position request failed");
        self.set_error(Some(error));
        self.transition_to(SessionPhase::LocationError);
        vec![SessionCommand::StopOrientation]
    }

    fn on_position_acquired(&mut self, coord: GeoCoordinate) -> Vec<SessionCommand> {
        let bearing = qibla_bearing(&coord);
        self.state.position = Some(coord);
        self.state.bearing = Some(bearing);
        self.touch();
        tracing::info!(position = %coord, bearing = %bearing, "Qibla bearing computed");
        self.recompute_alignment();

        if self.permission_required {
            self.transition_to(SessionPhase::AwaitingOrientationPermission);
            Vec::new()
        } else {
            self.state.permission_granted = true;
            self.transition_to(SessionPhase::Tracking);
            vec![SessionCommand::StartOrientation]
        }
    }

    fn on_permission_resolved(&mut self, status: PermissionStatus) -> Vec<SessionCommand> {
        self.permission_pending = false;
        match status {
            PermissionStatus::Granted => {
                self.state.permission_granted = true;
                if self.state.error == Some(ErrorKind::OrientationPermissionDenied) {
                    self.state.error = None;
                }
                self.transition_to(SessionPhase::Tracking);
                vec![SessionCommand::StartOrientation]
            }
            PermissionStatus::Denied => {
                tracing::warn!("Orientation permission denied");
                self.set_error(Some(ErrorKind::OrientationPermissionDenied));
                Vec::new()
            }
        }
    }

    fn on_orientation_sample(&mut self, sample: &OrientationSample) {
        let normalized = heading::normalize(sample);
        if !normalized.is_real() {
            tracing::trace!("Orientation sample without heading data, ignoring");
            return;
        }

        if self.state.heading_source.is_none() {
            tracing::info!(
                heading = %normalized.heading,
                source = %normalized.source,
                "First heading received"
            );
        }

        self.state.heading = normalized.heading;
        self.state.heading_source = Some(normalized.source);
        self.recompute_alignment();
        self.touch();
    }

    fn recompute_alignment(&mut self) {
        let previous = self.state.alignment;
        self.state.alignment = match (self.state.bearing, self.state.heading_source) {
            (Some(bearing), Some(_)) => Some(alignment::evaluate(bearing, self.state.heading)),
            _ => None,
        };

        let was_aligned = previous.map(|a| a.is_aligned).unwrap_or(false);
        let now_aligned = self.state.alignment.map(|a| a.is_aligned).unwrap_or(false);
        if was_aligned != now_aligned {
            tracing::debug!(aligned = now_aligned, heading = %self.state.heading, "Alignment changed");
        }
    }

    fn set_error(&mut self, error: Option<ErrorKind>) {
        if self.state.error != error {
            self.state.error = error;
            self.touch();
        }
    }

    fn transition_to(&mut self, phase: SessionPhase) {
        let old_phase = self.state.phase;
        if old_phase == phase {
            return;
        }
        self.state.phase = phase;
        self.touch();
        tracing::info!(from = %old_phase, to = %phase, "Session phase transition");
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
