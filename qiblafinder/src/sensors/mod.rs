//! Sensor sources feeding the session.
//!
//! # Architecture
//!
//! ```text
//! PositionSource ───── one-shot request ─────► Result<GeoCoordinate, PositionError>
//!
//! OrientationSource ── request_permission ───► PermissionStatus
//!                  └── subscribe(cancel) ────► mpsc::Receiver<OrientationSample>
//! ```
//!
//! Real platform bindings implement the two traits; the implementations in
//! this module cover manual positions, simulated rotation, line-fed input and
//! platforms without an orientation sensor.

mod lines;
mod permission;
mod position;
mod sweep;
mod traits;
mod unavailable;

pub use lines::{parse_sample_line, LineOrientationSource};
pub use permission::{PermissionGate, PermissionPolicy};
pub use position::{DeniedPositionSource, FixedPositionSource};
pub use sweep::{
    SampleConvention, SweepConfig, SweepOrientationSource, DEFAULT_SAMPLE_INTERVAL,
    DEFAULT_SWEEP_RATE_DEG_PER_SEC, MIN_SAMPLE_INTERVAL,
};
pub use traits::{
    BoxFuture, OrientationError, OrientationSource, PermissionStatus, PositionError,
    PositionOptions, PositionSource, ORIENTATION_CHANNEL_CAPACITY,
};
pub use unavailable::NoOrientationSource;
