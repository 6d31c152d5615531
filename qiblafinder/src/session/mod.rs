//! Qibla finder session.
//!
//! A session fuses the one-shot position source and the orientation stream
//! into a single alignment signal. It is split in two layers:
//!
//! - [`SessionMachine`]: pure, synchronous transitions over [`SessionState`]
//! - [`Session`]: async driver that owns the machine inside one task,
//!   executes its commands against the sensor sources and publishes
//!   [`SessionSnapshot`]s
//!
//! # Lifecycle
//!
//! ```text
//! Session::start ──► Started ──► RequestPosition
//!                                   │
//!                  PositionAcquired ┴ PositionFailed ──► LocationError
//!                         │
//!            permission required? ──yes──► AwaitingOrientationPermission
//!                         │                         │ grant
//!                         no                        ▼
//!                         └──────────────────► Tracking ◄── OrientationSample
//! ```
//!
//! The orientation listener registered on entry to `Tracking` is held as an
//! [`OrientationSubscription`] and released on every exit path.

mod driver;
mod error;
mod events;
mod machine;
mod state;
mod subscription;

pub use driver::{Session, SessionHandle};
pub use error::ErrorKind;
pub use events::{SessionCommand, SessionEvent};
pub use machine::SessionMachine;
pub use state::{SessionPhase, SessionSnapshot, SessionState};
pub use subscription::OrientationSubscription;
