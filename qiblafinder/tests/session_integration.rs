//! Integration tests for the Qibla finder session.
//!
//! These tests drive complete sessions through the public API:
//! - position source → bearing → orientation stream → alignment
//! - permission-gated orientation and retry after denial
//! - failure categories and graceful degradation
//! - listener release on every exit path
//!
//! Run with: `cargo test --test session_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use qiblafinder::bearing::qibla_bearing;
use qiblafinder::coord::{GeoCoordinate, KAABA};
use qiblafinder::heading::{HeadingSource, OrientationSample};
use qiblafinder::sensors::{
    BoxFuture, DeniedPositionSource, FixedPositionSource, LineOrientationSource,
    NoOrientationSource, OrientationError, OrientationSource, PermissionPolicy, PermissionStatus,
    SampleConvention, SweepConfig, SweepOrientationSource, ORIENTATION_CHANNEL_CAPACITY,
};
use qiblafinder::session::{ErrorKind, Session, SessionHandle, SessionPhase, SessionSnapshot};

// ============================================================================
// Helper Functions
// ============================================================================

const WAIT_LIMIT: Duration = Duration::from_secs(5);

fn new_york() -> GeoCoordinate {
    GeoCoordinate::new(40.7128, -74.0060).unwrap()
}

/// Wait for a snapshot matching `predicate`, failing the test after a limit.
async fn wait_until<F>(handle: &SessionHandle, predicate: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    tokio::time::timeout(WAIT_LIMIT, handle.wait_for(predicate))
        .await
        .expect("timed out waiting for session state")
        .expect("session ended before reaching expected state")
}

/// Orientation source that records every subscription and replays a fixed
/// list of samples, then keeps the stream open until cancelled.
struct RecordingOrientation {
    requires_permission: bool,
    samples: Vec<OrientationSample>,
    subscriptions: AtomicUsize,
    tokens: Mutex<Vec<CancellationToken>>,
}

impl RecordingOrientation {
    fn new(samples: Vec<OrientationSample>) -> Arc<Self> {
        Arc::new(Self {
            requires_permission: false,
            samples,
            subscriptions: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
        })
    }

    fn gated(samples: Vec<OrientationSample>) -> Arc<Self> {
        Arc::new(Self {
            requires_permission: true,
            samples,
            subscriptions: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
        })
    }

    fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    fn all_released(&self) -> bool {
        self.tokens.lock().unwrap().iter().all(|t| t.is_cancelled())
    }

    fn first_token(&self) -> CancellationToken {
        self.tokens.lock().unwrap()[0].clone()
    }
}

impl OrientationSource for RecordingOrientation {
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
        self.tokens.lock().unwrap().push(cancel.clone());

        let (tx, rx) = mpsc::channel(ORIENTATION_CHANNEL_CAPACITY);
        let samples = self.samples.clone();
        tokio::spawn(async move {
            for sample in samples {
                if tx.send(sample).await.is_err() {
                    return;
                }
            }
            cancel.cancelled().await;
        });
        Ok(rx)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// ============================================================================
// Location failures
// ============================================================================

/// Location denied ends the session without ever touching orientation.
#[tokio::test]
async fn test_location_denied_is_terminal() {
    let orientation = RecordingOrientation::new(vec![OrientationSample::compass(58.0)]);
    let handle = Session::start(
        Arc::new(DeniedPositionSource::permission_denied()),
        orientation.clone(),
    );

    let snapshot = wait_until(&handle, |s| s.phase == SessionPhase::LocationError).await;
    assert_eq!(snapshot.error, Some(ErrorKind::GeolocationDenied));
    assert_eq!(
        snapshot.error_message().as_deref(),
        Some("Location permission denied.")
    );
    assert!(snapshot.bearing.is_none());
    assert!(!snapshot.is_aligned());

    // User actions are accepted but change nothing
    assert!(handle.grant_orientation_permission());
    assert!(handle.dismiss_error());

    let final_snapshot = handle.shutdown().await;
    assert_eq!(final_snapshot.phase, SessionPhase::LocationError);
    assert_eq!(final_snapshot.error, Some(ErrorKind::GeolocationDenied));
    assert_eq!(orientation.subscription_count(), 0);
}

#[tokio::test]
async fn test_location_unsupported() {
    let orientation = RecordingOrientation::new(Vec::new());
    let handle = Session::start(
        Arc::new(DeniedPositionSource::unsupported()),
        orientation.clone(),
    );

    let snapshot = wait_until(&handle, |s| s.phase.is_terminal()).await;
    assert_eq!(snapshot.error, Some(ErrorKind::GeolocationUnsupported));
    assert!(snapshot.error.unwrap().is_blocking());

    handle.shutdown().await;
    assert_eq!(orientation.subscription_count(), 0);
}

// ============================================================================
// Tracking
// ============================================================================

/// Bearing from New York, then a compass sample near it reports aligned.
#[tokio::test]
async fn test_tracking_reports_alignment() {
    let bearing = qibla_bearing(&new_york()).degrees();
    let orientation = RecordingOrientation::new(vec![
        OrientationSample::compass(bearing + 90.0),
        OrientationSample::compass(bearing - 3.0),
    ]);
    let handle = Session::start(
        Arc::new(FixedPositionSource::new(new_york())),
        orientation.clone(),
    );

    let snapshot = wait_until(&handle, |s| s.is_aligned()).await;
    assert_eq!(snapshot.phase, SessionPhase::Tracking);
    assert!(snapshot.permission_granted);
    assert!((snapshot.bearing.unwrap().degrees() - 58.48).abs() < 0.05);
    assert!((snapshot.heading.degrees() - (bearing - 3.0)).abs() < 1e-9);
    assert_eq!(snapshot.heading_source, Some(HeadingSource::Compass));

    let alignment = snapshot.alignment.unwrap();
    assert!((alignment.signed_difference - 3.0).abs() < 1e-9);

    handle.shutdown().await;
    assert_eq!(orientation.subscription_count(), 1);
    assert!(orientation.all_released());
}

/// A rotation-angle sample is converted before evaluation.
#[tokio::test]
async fn test_rotation_convention_from_line_input() {
    let bearing = qibla_bearing(&new_york()).degrees();
    let input = format!("# simulated device\nnone\nalpha={:.4}\n", 360.0 - bearing);
    let reader: &'static [u8] = Box::leak(input.into_bytes().into_boxed_slice());

    let handle = Session::start(
        Arc::new(FixedPositionSource::new(new_york())),
        Arc::new(LineOrientationSource::new(reader)),
    );

    let snapshot = wait_until(&handle, |s| s.alignment.is_some()).await;
    assert_eq!(snapshot.heading_source, Some(HeadingSource::Rotation));
    assert!(snapshot.is_aligned());
    assert!((snapshot.heading.degrees() - bearing).abs() < 1e-3);

    handle.shutdown().await;
}

/// Simulated rotation sweeps through the target and is eventually aligned.
#[tokio::test]
async fn test_sweep_source_reaches_alignment() {
    let bearing = qibla_bearing(&new_york()).degrees();
    let sweep = SweepOrientationSource::new(SweepConfig {
        start_heading: bearing - 20.0,
        rate_deg_per_sec: 400.0,
        sample_interval: Duration::from_millis(5),
        convention: SampleConvention::Rotation,
        permission: PermissionPolicy::NotRequired,
    });

    let handle = Session::start(Arc::new(FixedPositionSource::new(new_york())), Arc::new(sweep));

    let snapshot = wait_until(&handle, |s| s.is_aligned()).await;
    assert_eq!(snapshot.heading_source, Some(HeadingSource::Rotation));
    assert!(snapshot.alignment.unwrap().signed_difference.abs() <= 5.0);

    handle.shutdown().await;
}

/// Standing at the target with the default north heading is never reported aligned.
#[tokio::test]
async fn test_no_alignment_before_first_heading() {
    let orientation = RecordingOrientation::new(Vec::new());
    let handle = Session::start(Arc::new(FixedPositionSource::new(KAABA)), orientation.clone());

    let snapshot = wait_until(&handle, |s| s.phase == SessionPhase::Tracking).await;
    assert!(snapshot.bearing.unwrap().degrees().is_finite());
    assert_eq!(snapshot.heading.degrees(), 0.0);
    assert!(snapshot.heading_source.is_none());
    assert!(snapshot.alignment.is_none());
    assert!(!snapshot.is_aligned());

    handle.shutdown().await;
}

// ============================================================================
// Orientation permission
// ============================================================================

/// Permission-gated platform waits for the user action before subscribing.
#[tokio::test]
async fn test_permission_required_waits_for_user() {
    let bearing = qibla_bearing(&new_york()).degrees();
    let orientation = RecordingOrientation::gated(vec![OrientationSample::compass(bearing)]);
    let handle = Session::start(
        Arc::new(FixedPositionSource::new(new_york())),
        orientation.clone(),
    );

    let snapshot =
        wait_until(&handle, |s| s.phase == SessionPhase::AwaitingOrientationPermission).await;
    assert!(snapshot.bearing.is_some());
    assert!(!snapshot.permission_granted);
    assert_eq!(orientation.subscription_count(), 0);

    assert!(handle.grant_orientation_permission());
    let snapshot = wait_until(&handle, |s| s.is_aligned()).await;
    assert!(snapshot.permission_granted);
    assert_eq!(orientation.subscription_count(), 1);

    handle.shutdown().await;
    assert!(orientation.all_released());
}

/// A denial keeps the bearing visible and the grant action can be retried.
#[tokio::test]
async fn test_permission_denied_then_retry() {
    let sweep = Arc::new(SweepOrientationSource::new(SweepConfig {
        sample_interval: Duration::from_millis(10),
        permission: PermissionPolicy::DenyFirst(1),
        ..SweepConfig::default()
    }));
    let handle = Session::start(Arc::new(FixedPositionSource::new(new_york())), sweep.clone());

    wait_until(&handle, |s| s.phase == SessionPhase::AwaitingOrientationPermission).await;

    handle.grant_orientation_permission();
    let snapshot = wait_until(&handle, |s| s.error.is_some()).await;
    assert_eq!(snapshot.error, Some(ErrorKind::OrientationPermissionDenied));
    assert_eq!(snapshot.phase, SessionPhase::AwaitingOrientationPermission);
    assert!(snapshot.bearing.is_some());
    assert!(!snapshot.error.unwrap().is_blocking());

    handle.grant_orientation_permission();
    let snapshot = wait_until(&handle, |s| s.phase == SessionPhase::Tracking).await;
    assert!(snapshot.error.is_none());
    assert!(snapshot.permission_granted);
    assert_eq!(sweep.permission_requests(), 2);

    handle.shutdown().await;
}

// ============================================================================
// Degradation and teardown
// ============================================================================

/// No orientation capability: bearing only, with a dismissible warning.
#[tokio::test]
async fn test_orientation_unavailable_degrades() {
    let handle = Session::start(
        Arc::new(FixedPositionSource::new(new_york())),
        Arc::new(NoOrientationSource),
    );

    let snapshot = wait_until(&handle, |s| s.error.is_some()).await;
    assert_eq!(snapshot.phase, SessionPhase::Tracking);
    assert_eq!(snapshot.error, Some(ErrorKind::OrientationUnavailable));
    assert!(snapshot.bearing.is_some());
    assert!(!snapshot.is_aligned());

    assert!(handle.dismiss_error());
    let snapshot = wait_until(&handle, |s| s.error.is_none()).await;
    assert_eq!(snapshot.phase, SessionPhase::Tracking);

    handle.shutdown().await;
}

/// An orientation stream that ends on its own degrades like a missing sensor.
#[tokio::test]
async fn test_ended_line_input_degrades() {
    let handle = Session::start(
        Arc::new(FixedPositionSource::new(new_york())),
        Arc::new(LineOrientationSource::new(&b""[..])),
    );

    let snapshot = wait_until(&handle, |s| s.error.is_some()).await;
    assert_eq!(snapshot.phase, SessionPhase::Tracking);
    assert_eq!(snapshot.error, Some(ErrorKind::OrientationUnavailable));
    assert!(snapshot.bearing.is_some());
    assert!(snapshot.alignment.is_none());

    handle.shutdown().await;
}

/// Dropping the handle releases the listener without an explicit shutdown.
#[tokio::test]
async fn test_drop_releases_listener() {
    let orientation = RecordingOrientation::new(Vec::new());
    let handle = Session::start(
        Arc::new(FixedPositionSource::new(new_york())),
        orientation.clone(),
    );
    wait_until(&handle, |s| s.phase == SessionPhase::Tracking).await;

    let token = orientation.first_token();
    assert!(!token.is_cancelled());

    drop(handle);
    tokio::time::timeout(WAIT_LIMIT, token.cancelled())
        .await
        .expect("listener was not released");
}

/// Shutting down while the position is still pending never subscribes.
#[tokio::test]
async fn test_shutdown_during_acquisition() {
    let orientation = RecordingOrientation::new(Vec::new());
    let slow = FixedPositionSource::new(new_york()).with_delay(Duration::from_secs(60));
    let handle = Session::start(Arc::new(slow), orientation.clone());

    wait_until(&handle, |s| s.phase == SessionPhase::AcquiringLocation).await;
    let final_snapshot = handle.shutdown().await;

    assert_eq!(final_snapshot.phase, SessionPhase::AcquiringLocation);
    assert!(final_snapshot.bearing.is_none());
    assert_eq!(orientation.subscription_count(), 0);
}

/// Snapshot revisions increase with every published update.
#[tokio::test]
async fn test_snapshot_revisions_increase() {
    let orientation = RecordingOrientation::new(vec![
        OrientationSample::compass(10.0),
        OrientationSample::compass(20.0),
    ]);
    let handle = Session::start(Arc::new(FixedPositionSource::new(KAABA)), orientation);
    let mut updates = handle.subscribe();

    let mut last = updates.borrow().revision;
    loop {
        tokio::time::timeout(WAIT_LIMIT, updates.changed())
            .await
            .expect("no update")
            .expect("session ended");
        let snapshot = updates.borrow_and_update().clone();
        assert!(snapshot.revision > last);
        last = snapshot.revision;
        if snapshot.heading.degrees() == 20.0 {
            break;
        }
    }

    handle.shutdown().await;
}
