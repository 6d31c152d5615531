//! Heading normalization for raw orientation samples.
//!
//! Orientation sensors report the device azimuth in one of two conventions:
//!
//! - **Compass**: a direct compass heading, 0 = north, clockwise-positive.
//!   Used as-is.
//! - **Rotation**: the rotation around the vertical axis (`alpha`), which
//!   grows counter-clockwise. Inverted as `360 − alpha`.
//!
//! # Preference Order
//!
//! ```text
//! compass_heading present  ──► Compass
//! else alpha present       ──► Rotation (360 − alpha)
//! else                     ──► Default (north, not a real heading)
//! ```
//!
//! Normalization never fails. A sample with neither field yields the default
//! heading tagged `HeadingSource::Default`, which the session uses to avoid
//! reporting alignment before any real heading has arrived.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::angle::normalize_degrees;

/// Device azimuth in degrees, clockwise from north, always in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Heading(f64);

impl Heading {
    /// Pointing north. Also the value used when no heading is available.
    pub const NORTH: Heading = Heading(0.0);

    /// Create a heading, normalizing the angle into `[0, 360)`.
    ///
    /// NaN and infinite input yield north.
    pub fn from_degrees(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Self::NORTH;
        }
        Self(normalize_degrees(degrees))
    }

    /// The heading in degrees.
    #[inline]
    pub fn degrees(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.0)
    }
}

/// A raw orientation reading as delivered by the platform.
///
/// Either field may be missing. Non-finite values are treated as missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientationSample {
    /// Direct compass heading (compass convention).
    pub compass_heading: Option<f64>,
    /// Rotation around the vertical axis (rotation convention).
    pub alpha: Option<f64>,
}

impl OrientationSample {
    /// Sample carrying a direct compass heading.
    pub fn compass(heading: f64) -> Self {
        Self {
            compass_heading: Some(heading),
            alpha: None,
        }
    }

    /// Sample carrying only a rotation angle.
    pub fn rotation(alpha: f64) -> Self {
        Self {
            compass_heading: None,
            alpha: Some(alpha),
        }
    }

    /// Sample with no usable heading data.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Which rule produced a normalized heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingSource {
    /// Taken from the direct compass field.
    Compass,
    /// Derived from the inverted rotation angle.
    Rotation,
    /// No usable field; default heading.
    Default,
}

impl fmt::Display for HeadingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadingSource::Compass => write!(f, "compass"),
            HeadingSource::Rotation => write!(f, "rotation"),
            HeadingSource::Default => write!(f, "default"),
        }
    }
}

/// Result of normalizing one orientation sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedHeading {
    /// The compass heading.
    pub heading: Heading,
    /// Rule that produced it.
    pub source: HeadingSource,
}

impl NormalizedHeading {
    /// Whether the heading came from real sensor data.
    pub fn is_real(&self) -> bool {
        self.source != HeadingSource::Default
    }
}

/// Normalize a raw orientation sample into a compass heading.
pub fn normalize(sample: &OrientationSample) -> NormalizedHeading {
    if let Some(compass) = sample.compass_heading.filter(|v| v.is_finite()) {
        return NormalizedHeading {
            heading: Heading::from_degrees(compass),
            source: HeadingSource::Compass,
        };
    }

    if let Some(alpha) = sample.alpha.filter(|v| v.is_finite()) {
        return NormalizedHeading {
            heading: Heading::from_degrees(360.0 - alpha),
            source: HeadingSource::Rotation,
        };
    }

    NormalizedHeading {
        heading: Heading::NORTH,
        source: HeadingSource::Default,
    }
}
