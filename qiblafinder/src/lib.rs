//! QiblaFinder - Live Qibla direction from position and device heading
//!
//! This library computes the great-circle bearing from the device's position
//! to the Kaaba, normalizes live orientation samples into a compass heading,
//! and runs a session state machine that fuses both sensor streams into a
//! single alignment signal for a presentation layer to display.
//!
//! # Architecture
//!
//! ```text
//! PositionSource ──► bearing::qibla_bearing ──► Bearing (cached) ─┐
//!                                                                  ├─► alignment::evaluate
//! OrientationSource ──► heading::normalize ──► Heading (live) ────┘
//!
//!        all sensor callbacks ──► SessionEvent ──► SessionMachine ──► SessionSnapshot
//! ```
//!
//! The calculators (`bearing`, `heading`, `alignment`) are pure and
//! synchronous. Only the `session` driver touches async sensor sources.

pub mod alignment;
pub mod angle;
pub mod bearing;
pub mod config;
pub mod coord;
pub mod heading;
pub mod logging;
pub mod sensors;
pub mod session;

/// Library version, taken from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
