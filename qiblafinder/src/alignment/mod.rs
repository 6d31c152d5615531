//! Alignment evaluation between the target bearing and the live heading.
//!
//! # Detection Logic
//!
//! ```text
//! diff        = bearing − heading, reduced into (−180, 180]
//! aligned     = |diff| < 5°
//! turn        = Right if diff > 0, Left if diff < 0, None if diff == 0
//! ```
//!
//! A difference of exactly ±180° always resolves to +180° (turn right), so a
//! device pointing directly away from the target does not flicker between
//! left and right hints.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::angle::{normalize_degrees, signed_difference};
use crate::bearing::Bearing;
use crate::heading::Heading;

/// Half-width of the band within which the device counts as facing the target.
pub const ALIGNMENT_TOLERANCE_DEG: f64 = 5.0;

/// Which way to rotate the device to face the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    /// Rotate counter-clockwise.
    Left,
    /// Rotate clockwise.
    Right,
    /// Already pointing exactly at the target.
    None,
}

impl TurnDirection {
    /// Human-readable description for logging/UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnDirection::Left => "left",
            TurnDirection::Right => "right",
            TurnDirection::None => "none",
        }
    }
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of comparing a bearing with a heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    /// Signed rotation from heading to bearing in `(-180, 180]`, clockwise positive.
    pub signed_difference: f64,
    /// Whether `|signed_difference|` is inside the tolerance band.
    pub is_aligned: bool,
    /// Hint for which way to turn.
    pub turn_direction: TurnDirection,
}

impl AlignmentResult {
    /// On-screen rotation for a pointer that should indicate the target,
    /// in `[0, 360)` relative to the top of the device.
    pub fn rotation_deg(&self) -> f64 {
        normalize_degrees(self.signed_difference)
    }
}

/// Evaluate alignment of `heading` against `bearing`.
pub fn evaluate(bearing: Bearing, heading: Heading) -> AlignmentResult {
    evaluate_degrees(bearing.degrees(), heading.degrees())
}

/// Evaluate alignment from raw angles in degrees.
pub fn evaluate_degrees(bearing: f64, heading: f64) -> AlignmentResult {
    let diff = signed_difference(bearing, heading);

    let turn_direction = if diff > 0.0 {
        TurnDirection::Right
    } else if diff < 0.0 {
        TurnDirection::Left
    } else {
        TurnDirection::None
    };

    AlignmentResult {
        signed_difference: diff,
        is_aligned: diff.abs() < ALIGNMENT_TOLERANCE_DEG,
        turn_direction,
    }
}
