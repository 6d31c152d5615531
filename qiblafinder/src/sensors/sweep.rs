//! Simulated orientation source: a device rotating at a constant rate.
//!
//! Useful for demos and tests where no real sensor exists. The sweep can emit
//! samples in either raw convention so both normalization paths get exercised.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use super::permission::{PermissionGate, PermissionPolicy};
use super::traits::{
    BoxFuture, OrientationError, OrientationSource, PermissionStatus,
    ORIENTATION_CHANNEL_CAPACITY,
};
use crate::angle::normalize_degrees;
use crate::heading::OrientationSample;

/// Default rotation rate in degrees per second.
pub const DEFAULT_SWEEP_RATE_DEG_PER_SEC: f64 = 15.0;

/// Default interval between samples.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Shortest interval a sweep ticks at; shorter configured intervals are raised to it.
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Raw convention the simulated sensor reports in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleConvention {
    /// Direct compass heading field.
    #[default]
    Compass,
    /// Counter-clockwise rotation angle (`alpha`).
    Rotation,
}

/// Configuration for a sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Heading of the first sample in degrees.
    pub start_heading: f64,
    /// Rotation rate in degrees per second; negative turns counter-clockwise.
    pub rate_deg_per_sec: f64,
    /// Time between samples.
    pub sample_interval: Duration,
    /// Raw convention for emitted samples.
    pub convention: SampleConvention,
    /// Permission behaviour.
    pub permission: PermissionPolicy,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start_heading: 0.0,
            rate_deg_per_sec: DEFAULT_SWEEP_RATE_DEG_PER_SEC,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            convention: SampleConvention::Compass,
            permission: PermissionPolicy::NotRequired,
        }
    }
}

/// Copyable description of the emitted sequence, owned by the sweep task.
#[derive(Debug, Clone, Copy)]
struct SweepPattern {
    start_heading: f64,
    rate_deg_per_sec: f64,
    sample_interval: Duration,
    convention: SampleConvention,
}

impl SweepPattern {
    /// Heading after `step` samples.
    fn heading_at(&self, step: u64) -> f64 {
        let elapsed = self.sample_interval.as_secs_f64() * step as f64;
        normalize_degrees(self.start_heading + self.rate_deg_per_sec * elapsed)
    }

    fn sample_for(&self, heading: f64) -> OrientationSample {
        match self.convention {
            SampleConvention::Compass => OrientationSample::compass(heading),
            SampleConvention::Rotation => {
                OrientationSample::rotation(normalize_degrees(360.0 - heading))
            }
        }
    }
}

/// Orientation source that sweeps the heading around the compass.
#[derive(Debug)]
pub struct SweepOrientationSource {
    pattern: SweepPattern,
    gate: PermissionGate,
}

impl SweepOrientationSource {
    /// Create a sweep source.
    pub fn new(config: SweepConfig) -> Self {
        Self {
            pattern: SweepPattern {
                start_heading: config.start_heading,
                rate_deg_per_sec: config.rate_deg_per_sec,
                sample_interval: config.sample_interval.max(MIN_SAMPLE_INTERVAL),
                convention: config.convention,
            },
            gate: PermissionGate::new(config.permission),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SweepConfig::default())
    }

    /// Number of permission requests answered so far.
    pub fn permission_requests(&self) -> u32 {
        self.gate.request_count()
    }
}

impl Default for SweepOrientationSource {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl OrientationSource for SweepOrientationSource {
    fn requires_permission(&self) -> bool {
        self.gate.requires_permission()
    }

    fn request_permission(&self) -> BoxFuture<'_, PermissionStatus> {
        let status = self.gate.resolve();
        Box::pin(async move { status })
    }

    fn subscribe(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<OrientationSample>, OrientationError> {
        let (tx, rx) = mpsc::channel(ORIENTATION_CHANNEL_CAPACITY);
        let pattern = self.pattern;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(pattern.sample_interval);
            let mut step = 0u64;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Sweep orientation listener released");
                        break;
                    }
                    _ = ticker.tick() => {
                        let sample = pattern.sample_for(pattern.heading_at(step));
                        step = step.wrapping_add(1);
                        match tx.try_send(sample) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                tracing::trace!("Orientation channel full, dropping sample");
                            }
                            Err(TrySendError::Closed(_)) => {
                                tracing::debug!("Orientation receiver dropped, stopping sweep");
                                break;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "sweep"
    }
}
