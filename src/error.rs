//! Error types for the headmouse library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File or socket I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read, parsed or validated
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Calibration record could not be saved or loaded
    #[error("Calibration persistence error: {0}")]
    Persistence(String),

    /// A calibration step received no telemetry during its sampling window
    #[error("No data from OpenTrack during calibration step '{step}'")]
    NoData {
        /// Label of the step that came up empty
        step: &'static str,
    },

    /// Calibration has no usable dynamic range on at least one axis
    #[error("Degenerate calibration: yaw range {yaw_range}, pitch range {pitch_range}")]
    DegenerateCalibration {
        /// Yaw range of the rejected calibration
        yaw_range: f64,
        /// Pitch range of the rejected calibration
        pitch_range: f64,
    },

    /// A calibration session was abandoned because shutdown was requested
    #[error("Calibration interrupted by shutdown request")]
    Interrupted,

    /// Cursor control or screen query failed
    #[error("Cursor control error: {0}")]
    CursorControl(String),

    /// Signal handler installation or delivery failed
    #[error("Signal error: {0}")]
    Signal(String),

    /// Locating or signalling the running tracker failed
    #[error("Control error: {0}")]
    ControlError(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures that invalidate a calibration attempt but leave the
    /// process able to continue with a previous calibration.
    #[must_use]
    pub const fn is_calibration_failure(&self) -> bool {
        matches!(
            self,
            Self::NoData { .. } | Self::DegenerateCalibration { .. } | Self::Interrupted
        )
    }
}
