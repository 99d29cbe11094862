//! Safe casting utilities for pixel coordinates

/// Clamp and convert f64 to i16 for X11 pointer coordinates
///
/// Non-finite values map to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_i16_clamp(value: f64) -> i16 {
    if !value.is_finite() {
        return 0;
    }
    value.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}
