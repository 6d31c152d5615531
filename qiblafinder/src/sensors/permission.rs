//! Permission behaviour for simulated orientation sources.

use std::sync::atomic::{AtomicU32, Ordering};

use super::traits::PermissionStatus;

/// How a simulated source answers permission requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionPolicy {
    /// No permission step; `subscribe` may be called immediately.
    #[default]
    NotRequired,
    /// Permission required and granted on request.
    Grant,
    /// Permission required and always denied.
    Deny,
    /// Permission required; the first `n` requests are denied.
    DenyFirst(u32),
}

/// Tracks permission requests against a `PermissionPolicy`.
#[derive(Debug)]
pub struct PermissionGate {
    policy: PermissionPolicy,
    requests: AtomicU32,
}

impl PermissionGate {
    /// Create a gate for the given policy.
    pub fn new(policy: PermissionPolicy) -> Self {
        Self {
            policy,
            requests: AtomicU32::new(0),
        }
    }

    /// Whether an explicit grant is needed before subscribing.
    pub fn requires_permission(&self) -> bool {
        self.policy != PermissionPolicy::NotRequired
    }

    /// Answer one permission request.
    pub fn resolve(&self) -> PermissionStatus {
        let attempt = self.requests.fetch_add(1, Ordering::SeqCst);
        let status = match self.policy {
            PermissionPolicy::NotRequired | PermissionPolicy::Grant => PermissionStatus::Granted,
            PermissionPolicy::Deny => PermissionStatus::Denied,
            PermissionPolicy::DenyFirst(n) if attempt < n => PermissionStatus::Denied,
            PermissionPolicy::DenyFirst(_) => PermissionStatus::Granted,
        };
        tracing::debug!(attempt = attempt + 1, ?status, "Orientation permission requested");
        status
    }

    /// Number of permission requests answered so far.
    pub fn request_count(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::new(PermissionPolicy::default())
    }
}
