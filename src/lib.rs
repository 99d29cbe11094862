//! Calibrated head-tracking cursor control.
//!
//! This library turns OpenTrack head-orientation telemetry into absolute
//! cursor positions:
//! - [`telemetry`] receives the fixed six-`f64` UDP packets
//! - [`calibration`] runs the guided five-point calibration
//! - [`store`] persists the calibration across restarts
//! - [`mapping`] maps yaw/pitch onto the screen
//! - [`control`] carries toggle/recalibrate requests from signal handlers
//! - [`tracking`] ties it together in the main loop
//!
//! # Examples
//!
//! ## Mapping a reading
//!
//! ```
//! use headmouse::{
//!     calibration::CalibrationRecord,
//!     mapping::{map_to_screen, ScreenGeometry},
//!     telemetry::OrientationSample,
//! };
//!
//! # fn main() -> headmouse::Result<()> {
//! let calibration = CalibrationRecord {
//!     center_yaw: 0.0,
//!     center_pitch: 0.0,
//!     yaw_range: 30.0,
//!     pitch_range: 20.0,
//! };
//! let geometry = ScreenGeometry::new(1920, 1080);
//!
//! // Looking up and to the right ends in the top-right corner
//! let point = map_to_screen(OrientationSample::new(30.0, 20.0), geometry, &calibration)?;
//! assert_eq!((point.x, point.y), (1920.0, 0.0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Running the tracker
//!
//! ```no_run
//! use headmouse::{app::HeadMouseApp, config::Config};
//!
//! # fn main() -> headmouse::Result<()> {
//! let mut app = HeadMouseApp::new(Config::default())?;
//! app.run()?;
//! # Ok(())
//! # }
//! ```

/// OpenTrack UDP telemetry decoding and reception
pub mod telemetry;

/// Guided five-point calibration procedure
pub mod calibration;

/// Calibration persistence
pub mod store;

/// Head angle to screen coordinate mapping
pub mod mapping;

/// Signal-driven control state and process identity file
pub mod control;

/// The tracking loop
pub mod tracking;

/// Utility functions for coordinate conversions
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Cursor control module for X11 systems
pub mod cursor_control;

/// Console status output
pub mod console;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
