//! Great-circle bearing calculation.
//!
//! Computes the initial compass direction of the great-circle path from a
//! position to a target, using a spherical-earth model.
//!
//! # Formula
//!
//! ```text
//! y = sin(λt − λ)
//! x = cos(φ)·tan(φt) − sin(φ)·cos(λt − λ)
//! bearing = (atan2(y, x) in degrees + 360) mod 360
//! ```
//!
//! Input ranges are not checked here. Out-of-range coordinates produce a
//! finite but meaningless bearing; validation belongs to whoever builds the
//! `GeoCoordinate`.
//!
//! # Example
//!
//! ```
//! use qiblafinder::bearing::qibla_bearing;
//! use qiblafinder::coord::GeoCoordinate;
//!
//! let new_york = GeoCoordinate::new(40.7128, -74.0060).unwrap();
//! let bearing = qibla_bearing(&new_york);
//! assert!((bearing.degrees() - 58.48).abs() < 0.1);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::angle::normalize_degrees;
use crate::coord::{GeoCoordinate, KAABA};

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Compass direction in degrees, clockwise from north, always in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bearing(f64);

impl Bearing {
    /// Create a bearing, normalizing the angle into `[0, 360)`.
    ///
    /// NaN and infinite input yield north.
    pub fn from_degrees(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Self(0.0);
        }
        Self(normalize_degrees(degrees))
    }

    /// The bearing in degrees.
    #[inline]
    pub fn degrees(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Bearing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°", self.0)
    }
}

/// Initial great-circle bearing from `from` towards `to`.
///
/// Coincident points give `x = y = 0`; `atan2(0, 0)` is well defined in Rust
/// and yields a finite angle, so this never panics.
pub fn initial_bearing(from: &GeoCoordinate, to: &GeoCoordinate) -> Bearing {
    let phi = from.latitude_rad();
    let lambda = from.longitude_rad();
    let phi_t = to.latitude_rad();
    let lambda_t = to.longitude_rad();

    let delta_lambda = lambda_t - lambda;
    let y = delta_lambda.sin();
    let x = phi.cos() * phi_t.tan() - phi.sin() * delta_lambda.cos();

    Bearing::from_degrees(y.atan2(x).to_degrees())
}

/// Bearing from `from` towards the Kaaba.
pub fn qibla_bearing(from: &GeoCoordinate) -> Bearing {
    initial_bearing(from, &KAABA)
}

/// Bearing towards the Kaaba from raw latitude/longitude in degrees.
pub fn qibla_bearing_deg(latitude: f64, longitude: f64) -> f64 {
    qibla_bearing(&GeoCoordinate::new_unchecked(latitude, longitude)).degrees()
}

/// Great-circle (haversine) distance between two points in kilometres.
pub fn distance_km(from: &GeoCoordinate, to: &GeoCoordinate) -> f64 {
    let phi1 = from.latitude_rad();
    let phi2 = to.latitude_rad();
    let d_phi = phi2 - phi1;
    let d_lambda = to.longitude_rad() - from.longitude_rad();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance from `from` to the Kaaba in kilometres.
pub fn qibla_distance_km(from: &GeoCoordinate) -> f64 {
    distance_km(from, &KAABA)
}
