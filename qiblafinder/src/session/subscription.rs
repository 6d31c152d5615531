//! Scoped ownership of a live orientation listener.

use std::time::Instant;

use tokio_util::sync::{CancellationToken, DropGuard};

/// A registered orientation listener.
///
/// Dropping the subscription cancels its token, which stops both the
/// source's sampling task and the forwarder feeding the session. Every exit
/// path of the session drops it, so a listener never outlives its session.
pub struct OrientationSubscription {
    token: CancellationToken,
    source: String,
    registered_at: Instant,
    _guard: DropGuard,
}

impl OrientationSubscription {
    /// Take ownership of `token` for the listener registered with `source`.
    pub fn new(token: CancellationToken, source: impl Into<String>) -> Self {
        Self {
            _guard: token.clone().drop_guard(),
            token,
            source: source.into(),
            registered_at: Instant::now(),
        }
    }

    /// Token observed by the listener tasks.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the listener has not been cancelled.
    ///
    /// This does not observe the source's stream. When a stream ends on its
    /// own the session reports the orientation as unavailable and drops the
    /// subscription, so a held subscription outlives its stream only briefly.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Name of the orientation source.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for OrientationSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrientationSubscription")
            .field("source", &self.source)
            .field("active", &self.is_active())
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

impl Drop for OrientationSubscription {
    fn drop(&mut self) {
        tracing::debug!(
            source = %self.source,
            active_secs = self.registered_at.elapsed().as_secs_f64(),
            "Releasing orientation listener"
        );
    }
}
