//! Mapping from head angles to absolute screen coordinates.
//!
//! Angles are taken relative to the calibrated center, clamped to the
//! calibrated range on each axis, normalized to `[0, 1]` and scaled to the
//! screen. Looking up moves the cursor towards the top of the screen.

use crate::{
    calibration::CalibrationRecord,
    constants::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH},
    error::{Error, Result},
    telemetry::OrientationSample,
};

/// Screen size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

impl ScreenGeometry {
    /// Create a new geometry
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT)
    }
}

/// Absolute cursor target in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Map a sample to normalized `[0, 1]` coordinates, vertical axis inverted.
///
/// # Errors
///
/// Returns [`Error::DegenerateCalibration`] if either range is not strictly
/// positive, or [`Error::InvalidInput`] for a non-finite sample.
pub fn normalize(sample: OrientationSample, calibration: &CalibrationRecord) -> Result<(f64, f64)> {
    calibration.validate()?;
    if !sample.is_finite() {
        return Err(Error::InvalidInput(format!(
            "Non-finite orientation: yaw={}, pitch={}",
            sample.yaw, sample.pitch
        )));
    }

    let yaw_range = calibration.yaw_range;
    let pitch_range = calibration.pitch_range;

    let rel_yaw = (sample.yaw - calibration.center_yaw).clamp(-yaw_range, yaw_range);
    let rel_pitch = (sample.pitch - calibration.center_pitch).clamp(-pitch_range, pitch_range);

    let norm_x = (rel_yaw + yaw_range) / (2.0 * yaw_range);
    let norm_y = (rel_pitch + pitch_range) / (2.0 * pitch_range);

    Ok((norm_x, 1.0 - norm_y))
}

/// Map a sample to an absolute position on a screen of the given geometry.
///
/// The result always lies within `[0, width] x [0, height]`.
///
/// # Errors
///
/// Returns [`crate::Error::DegenerateCalibration`] if either range is not
/// strictly positive.
pub fn map_to_screen(
    sample: OrientationSample,
    geometry: ScreenGeometry,
    calibration: &CalibrationRecord,
) -> Result<ScreenPoint> {
    let (norm_x, norm_y) = normalize(sample, calibration)?;
    Ok(ScreenPoint {
        x: norm_x * f64::from(geometry.width),
        y: norm_y * f64::from(geometry.height),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibration() -> CalibrationRecord {
        CalibrationRecord {
            center_yaw: 0.0,
            center_pitch: 0.0,
            yaw_range: 30.0,
            pitch_range: 20.0,
        }
    }

    #[test]
    fn test_corners() {
        let geometry = ScreenGeometry::new(1920, 1080);
        let cal = calibration();

        let p = map_to_screen(OrientationSample::new(30.0, 20.0), geometry, &cal).unwrap();
        assert_eq!((p.x, p.y), (1920.0, 0.0));

        let p = map_to_screen(OrientationSample::new(30.0, -20.0), geometry, &cal).unwrap();
        assert_eq!((p.x, p.y), (1920.0, 1080.0));

        let p = map_to_screen(OrientationSample::new(-30.0, 0.0), geometry, &cal).unwrap();
        assert_eq!((p.x, p.y), (0.0, 540.0));
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let geometry = ScreenGeometry::new(1920, 1080);
        let p = map_to_screen(OrientationSample::new(-95.0, 80.0), geometry, &calibration()).unwrap();
        assert_eq!((p.x, p.y), (0.0, 0.0));
    }

    #[test]
    fn test_zero_range_is_rejected() {
        let mut cal = calibration();
        cal.pitch_range = 0.0;
        let result = normalize(OrientationSample::new(1.0, 1.0), &cal);
        assert!(matches!(result, Err(Error::DegenerateCalibration { .. })));
    }

    #[test]
    fn test_non_finite_sample_is_rejected() {
        let result = normalize(OrientationSample::new(f64::NAN, 0.0), &calibration());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_default_geometry() {
        assert_eq!(ScreenGeometry::default(), ScreenGeometry::new(1920, 1080));
    }
}
