//! Async session driver.
//!
//! Runs a `SessionMachine` inside a single tokio task. Sensor callbacks are
//! spawned as small tasks that post their result back as a `SessionEvent`;
//! the loop applies events one at a time, executes the returned commands and
//! publishes a `SessionSnapshot` on a watch channel after every change.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use qiblafinder::sensors::{FixedPositionSource, SweepOrientationSource};
//! use qiblafinder::session::Session;
//!
//! let handle = Session::start(
//!     Arc::new(FixedPositionSource::new(coord)),
//!     Arc::new(SweepOrientationSource::with_defaults()),
//! );
//!
//! let mut updates = handle.subscribe();
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow().clone();
//!     render(&snapshot);
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::events::{SessionCommand, SessionEvent};
use super::machine::SessionMachine;
use super::state::SessionSnapshot;
use super::subscription::OrientationSubscription;
use crate::heading::OrientationSample;
use crate::sensors::{OrientationSource, PositionOptions, PositionSource};

/// Entry point for starting sessions.
pub struct Session;

impl Session {
    /// Start a session on the current tokio runtime.
    ///
    /// The orientation source is probed for its permission requirement, then
    /// the position request is issued immediately.
    pub fn start(
        position: Arc<dyn PositionSource>,
        orientation: Arc<dyn OrientationSource>,
    ) -> SessionHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let machine = SessionMachine::new();
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());
        let cancellation = CancellationToken::new();

        tracing::info!(
            position_source = position.name(),
            orientation_source = orientation.name(),
            "Starting session"
        );

        let session_loop = SessionLoop {
            machine,
            position,
            orientation,
            events_tx: events_tx.clone(),
            snapshots: snapshot_tx,
            cancellation: cancellation.clone(),
            subscription: None,
        };

        let join = tokio::spawn(session_loop.run(events_rx));

        SessionHandle {
            events: events_tx,
            snapshots: snapshot_rx,
            cancellation,
            join: Some(join),
        }
    }
}

/// Handle held by the presentation layer.
///
/// Dropping the handle tears the session down and releases any orientation
/// listener.
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
    cancellation: CancellationToken,
    join: Option<JoinHandle<SessionSnapshot>>,
}

impl SessionHandle {
    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// User action: grant orientation permission.
    ///
    /// Returns `false` if the session has already ended.
    pub fn grant_orientation_permission(&self) -> bool {
        self.send(SessionEvent::PermissionRequested)
    }

    /// User action: dismiss the current warning.
    ///
    /// Returns `false` if the session has already ended.
    pub fn dismiss_error(&self) -> bool {
        self.send(SessionEvent::DismissError)
    }

    /// Wait until a snapshot satisfies `predicate`.
    ///
    /// Returns `None` if the session ends first.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Option<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        let snapshot = match rx.wait_for(|snapshot| predicate(snapshot)).await {
            Ok(snapshot) => SessionSnapshot::clone(&snapshot),
            Err(_) => return None,
        };
        Some(snapshot)
    }

    /// Request teardown without waiting for it.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether teardown has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Tear the session down and return its final snapshot.
    pub async fn shutdown(mut self) -> SessionSnapshot {
        self.cancellation.cancel();
        match self.join.take() {
            Some(join) => match join.await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(error = %e, "Session task ended abnormally");
                    self.snapshot()
                }
            },
            None => self.snapshot(),
        }
    }

    fn send(&self, event: SessionEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

/// State owned by the session task.
struct SessionLoop {
    machine: SessionMachine,
    position: Arc<dyn PositionSource>,
    orientation: Arc<dyn OrientationSource>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
    cancellation: CancellationToken,
    subscription: Option<OrientationSubscription>,
}

impl SessionLoop {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) -> SessionSnapshot {
        let permission_required = self.orientation.requires_permission();
        self.dispatch(SessionEvent::Started {
            permission_required,
        });

        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => SessionEvent::Shutdown,
                event = events.recv() => event.unwrap_or(SessionEvent::Shutdown),
            };

            let is_shutdown = matches!(event, SessionEvent::Shutdown);
            self.dispatch(event);
            if is_shutdown {
                break;
            }
        }

        // Covers exits where StopOrientation was never issued
        self.release_orientation();
        self.cancellation.cancel();

        let snapshot = self.machine.snapshot();
        tracing::info!(phase = %snapshot.phase, "Session ended");
        snapshot
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let revision = self.machine.revision();
        let commands = self.machine.handle(event);

        for command in commands {
            self.execute(command);
        }

        if self.machine.revision() != revision {
            self.snapshots.send_replace(self.machine.snapshot());
        }
    }

    fn execute(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::RequestPosition => self.request_position(),
            SessionCommand::RequestOrientationPermission => self.request_permission(),
            SessionCommand::StartOrientation => self.start_orientation(),
            SessionCommand::StopOrientation => self.release_orientation(),
        }
    }

    fn request_position(&self) {
        let position = Arc::clone(&self.position);
        let events = self.events_tx.clone();
        let cancellation = self.cancellation.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    tracing::debug!("Position request abandoned");
                }
                result = position.request_position(PositionOptions::DEFAULT) => {
                    let event = match result {
                        Ok(coord) => SessionEvent::PositionAcquired(coord),
                        Err(e) => SessionEvent::PositionFailed(e),
                    };
                    let _ = events.send(event);
                }
            }
        });
    }

    fn request_permission(&self) {
        let orientation = Arc::clone(&self.orientation);
        let events = self.events_tx.clone();
        let cancellation = self.cancellation.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    tracing::debug!("Permission request abandoned");
                }
                status = orientation.request_permission() => {
                    let _ = events.send(SessionEvent::PermissionResolved(status));
                }
            }
        });
    }

    fn start_orientation(&mut self) {
        if self.subscription.is_some() {
            tracing::debug!("Orientation listener already registered");
            return;
        }

        let token = self.cancellation.child_token();
        match self.orientation.subscribe(token.clone()) {
            Ok(samples) => {
                tokio::spawn(forward_samples(samples, token.clone(), self.events_tx.clone()));
                self.subscription = Some(OrientationSubscription::new(
                    token,
                    self.orientation.name(),
                ));
                tracing::info!(source = self.orientation.name(), "Orientation listener registered");
            }
            Err(e) => {
                token.cancel();
                tracing::warn!(error = %e, "Orientation listener could not be registered");
                let _ = self.events_tx.send(SessionEvent::OrientationUnavailable);
            }
        }
    }

    fn release_orientation(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            drop(subscription);
        }
    }
}

/// Relay samples from a source channel into the session event channel.
///
/// A stream that ends without being cancelled is reported as the orientation
/// becoming unavailable, so the session releases the listener and warns.
async fn forward_samples(
    mut samples: mpsc::Receiver<OrientationSample>,
    token: CancellationToken,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            sample = samples.recv() => match sample {
                Some(sample) => {
                    tracing::trace!(?sample, "Orientation sample");
                    if events.send(SessionEvent::OrientationSample(sample)).is_err() {
                        break;
                    }
                }
                None => {
                    if !token.is_cancelled() {
                        tracing::warn!("Orientation source closed its stream");
                        let _ = events.send(SessionEvent::OrientationUnavailable);
                    }
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::coord::{GeoCoordinate, KAABA};
    use crate::sensors::{
        BoxFuture, DeniedPositionSource, FixedPositionSource, OrientationError,
        PermissionStatus, ORIENTATION_CHANNEL_CAPACITY,
    };
    use crate::session::{ErrorKind, SessionPhase};

    /// Orientation source driven by the test through a sender.
    struct ManualOrientation {
        requires_permission: bool,
        subscriptions: AtomicUsize,
        tokens: std::sync::Mutex<Vec<CancellationToken>>,
        feed: std::sync::Mutex<Option<mpsc::Receiver<OrientationSample>>>,
    }

    impl ManualOrientation {
        fn new(requires_permission: bool) -> (Arc<Self>, mpsc::Sender<OrientationSample>) {
            let (tx, rx) = mpsc::channel(ORIENTATION_CHANNEL_CAPACITY);
            let source = Arc::new(Self {
                requires_permission,
                subscriptions: AtomicUsize::new(0),
                tokens: std::sync::Mutex::new(Vec::new()),
                feed: std::sync::Mutex::new(Some(rx)),
            });
            (source, tx)
        }
    }

    impl OrientationSource for ManualOrientation {
        fn requires_permission(&self) -> bool {
            self.requires_permission
        }

        fn request_permission(&self) -> BoxFuture<'_, PermissionStatus> {
            Box::pin(async { PermissionStatus::Granted })
        }

        fn subscribe(
            &self,
            cancel: CancellationToken,
        ) -> Result<mpsc::Receiver<OrientationSample>, OrientationError> {
            self.subscriptions.fetch_add(1, Ordering::SeqCst);
            self.tokens.lock().unwrap().push(cancel);
            self.feed
                .lock()
                .unwrap()
                .take()
                .ok_or(OrientationError::Unavailable)
        }

        fn name(&self) -> &str {
            "manual"
        }
    }

    fn new_york() -> GeoCoordinate {
        GeoCoordinate::new(40.7128, -74.0060).unwrap()
    }

    #[tokio::test]
    async fn test_tracking_session_updates_alignment() {
        let (orientation, feed) = ManualOrientation::new(false);
        let handle = Session::start(
            Arc::new(FixedPositionSource::new(new_york())),
            orientation.clone(),
        );

        let snapshot = handle
            .wait_for(|s| s.phase == SessionPhase::Tracking)
            .await
            .unwrap();
        let bearing = snapshot.bearing.unwrap().degrees();
        assert!(!snapshot.is_aligned());

        feed.send(OrientationSample::compass(bearing + 2.0)).await.unwrap();
        let snapshot = handle.wait_for(|s| s.alignment.is_some()).await.unwrap();
        assert!(snapshot.is_aligned());

        let final_snapshot = handle.shutdown().await;
        assert_eq!(final_snapshot.phase, SessionPhase::Tracking);
        assert_eq!(orientation.subscriptions.load(Ordering::SeqCst), 1);
        assert!(orientation.tokens.lock().unwrap()[0].is_cancelled());
    }

    #[tokio::test]
    async fn test_location_denied_never_subscribes() {
        let (orientation, _feed) = ManualOrientation::new(false);
        let handle = Session::start(
            Arc::new(DeniedPositionSource::permission_denied()),
            orientation.clone(),
        );

        let snapshot = handle
            .wait_for(|s| s.phase == SessionPhase::LocationError)
            .await
            .unwrap();
        assert_eq!(snapshot.error, Some(ErrorKind::GeolocationDenied));

        handle.shutdown().await;
        assert_eq!(orientation.subscriptions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_permission_flow() {
        let (orientation, _feed) = ManualOrientation::new(true);
        let handle = Session::start(Arc::new(FixedPositionSource::new(KAABA)), orientation.clone());

        handle
            .wait_for(|s| s.phase == SessionPhase::AwaitingOrientationPermission)
            .await
            .unwrap();
        assert_eq!(orientation.subscriptions.load(Ordering::SeqCst), 0);

        assert!(handle.grant_orientation_permission());
        let snapshot = handle
            .wait_for(|s| s.phase == SessionPhase::Tracking)
            .await
            .unwrap();
        assert!(snapshot.permission_granted);

        handle.shutdown().await;
        assert_eq!(orientation.subscriptions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closed_stream_reports_unavailable() {
        let (orientation, feed) = ManualOrientation::new(false);
        let handle = Session::start(
            Arc::new(FixedPositionSource::new(new_york())),
            orientation.clone(),
        );
        let snapshot = handle
            .wait_for(|s| s.phase == SessionPhase::Tracking)
            .await
            .unwrap();
        let bearing = snapshot.bearing.unwrap().degrees();

        feed.send(OrientationSample::compass(bearing)).await.unwrap();
        drop(feed);

        let snapshot = handle.wait_for(|s| s.error.is_some()).await.unwrap();
        assert_eq!(snapshot.error, Some(ErrorKind::OrientationUnavailable));
        assert_eq!(snapshot.phase, SessionPhase::Tracking);
        assert!(snapshot.is_aligned());

        let token = orientation.tokens.lock().unwrap()[0].clone();
        token.cancelled().await;
        assert!(token.is_cancelled());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_dropping_handle_releases_listener() {
        let (orientation, _feed) = ManualOrientation::new(false);
        let handle = Session::start(Arc::new(FixedPositionSource::new(KAABA)), orientation.clone());
        handle
            .wait_for(|s| s.phase == SessionPhase::Tracking)
            .await
            .unwrap();

        let token = orientation.tokens.lock().unwrap()[0].clone();
        assert!(!token.is_cancelled());

        drop(handle);
        token.cancelled().await;
        assert!(token.is_cancelled());
    }
}
