//! Degree normalization shared by bearings, headings and alignment.
//!
//! Compass angles live in `[0, 360)`; differences between two compass angles
//! live in `(-180, 180]`. Both reductions are done in one place so every
//! consumer agrees on how 0/360 and ±180 are represented.

/// Normalize an angle in degrees into `[0, 360)`.
///
/// `360.0`, `-0.0` and values that round up to `360.0` all map to `0.0`.
/// NaN is passed through unchanged.
#[inline]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = ((degrees % 360.0) + 360.0) % 360.0;
    if normalized >= 360.0 || normalized == 0.0 {
        // Collapses -0.0 as well
        0.0
    } else {
        normalized
    }
}

/// Signed shortest rotation from `current` to `target`, in `(-180, 180]`.
///
/// Positive means clockwise. The reduction is a single ceil-based step, so a
/// difference of exactly ±180 always resolves to `+180`.
#[inline]
pub fn signed_difference(target: f64, current: f64) -> f64 {
    let diff = target - current;
    let reduced = diff - 360.0 * ((diff - 180.0) / 360.0).ceil();
    if reduced == 0.0 {
        0.0
    } else {
        reduced
    }
}
