//! Main application module: startup sequence and wiring.

use crate::{
    calibration::{CalibrationRecord, Calibrator, ConsoleGate, StepGate},
    config::Config,
    console,
    control::{self, ControlState, PidFile},
    cursor_control::{screen_geometry_or, CursorController},
    error::{Error, Result},
    store::CalibrationStore,
    telemetry::{TelemetrySource, UdpTelemetrySource},
    tracking::{TrackingLoop, TrackingSettings},
};
use log::{info, warn};
use std::sync::Arc;

/// Main application struct
pub struct HeadMouseApp {
    config: Config,
    control: Arc<ControlState>,
}

impl HeadMouseApp {
    /// Create the application and start listening for control signals
    ///
    /// # Errors
    ///
    /// Returns an error if signal handlers cannot be installed.
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing headmouse");
        let control = Arc::new(ControlState::new());
        control::install_control_handlers(&control)?;
        Ok(Self { config, control })
    }

    /// Shared control flags
    #[must_use]
    pub fn control(&self) -> Arc<ControlState> {
        Arc::clone(&self.control)
    }

    /// Run until interrupted.
    ///
    /// # Errors
    ///
    /// Fails if the telemetry socket cannot be bound, or if no calibration
    /// exists and the first calibration attempt receives no telemetry.
    pub fn run(&mut self) -> Result<()> {
        control::install_shutdown_handlers(&self.control)?;

        let cursor = match CursorController::new() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Failed to initialize cursor control: {}", e);
                None
            }
        };
        let geometry = screen_geometry_or(cursor.as_ref(), self.config.fallback_geometry());
        console::screen(geometry);

        let mut source = UdpTelemetrySource::bind(self.config.bind_addr()?)?;

        let store = match &self.config.calibration.file {
            Some(path) => CalibrationStore::new(path),
            None => CalibrationStore::default_location()?,
        };
        let gate = ConsoleGate::detect(self.config.auto_proceed_delay()).interruptible(&self.control);
        let mut calibrator =
            Calibrator::new(gate, store, self.config.calibration_settings()).interruptible(&self.control);

        let calibration = match load_or_calibrate(&mut calibrator, &mut source) {
            Ok(calibration) => calibration,
            Err(Error::Interrupted) => {
                console::blank();
                console::line("Exiting...");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if self.control.take_recalibration_request() {
            info!("Ignoring recalibration request received during startup");
        }

        let pid_file = PidFile::new(&self.config.control.pid_file);
        if let Err(e) = pid_file.write_current() {
            warn!("External control unavailable: {}", e);
        }

        console::control_help();
        let control = self.control();
        let started = !console::stdin_is_terminal()
            || console::wait_for_enter_unless("Press ENTER to start mouse control...", || {
                control.shutdown_requested()
            })?;
        if started {
            console::blank();
            console::line("Running... Move your head to control the mouse!");
            console::line("Press Ctrl+C to exit");
            console::blank();
        }

        let settings = TrackingSettings {
            geometry,
            poll_interval: self.config.poll_interval(),
        };
        let mut tracking = TrackingLoop::new(source, cursor, calibrator, self.control(), settings, calibration);
        tracking.run()?;

        console::blank();
        console::line("Exiting...");
        if let Err(e) = pid_file.remove_if_current() {
            warn!("Failed to remove {}: {}", pid_file.path().display(), e);
        }

        info!("Application shutting down");
        Ok(())
    }
}

/// Use the saved calibration, or run the procedure if there is none.
///
/// A load failure is reported and treated as "no calibration". A calibration
/// that spans no range is repeated until it succeeds.
///
/// # Errors
///
/// Returns [`Error::NoData`] when a step received no telemetry and
/// [`Error::Interrupted`] when shutdown was requested meanwhile.
pub fn load_or_calibrate<G, S>(calibrator: &mut Calibrator<G>, source: &mut S) -> Result<CalibrationRecord>
where
    G: StepGate,
    S: TelemetrySource + ?Sized,
{
    match calibrator.store().load() {
        Ok(Some(record)) => {
            console::line(&format!(
                "✓ Loaded calibration from {}",
                calibrator.store().path().display()
            ));
            console::calibration_summary(&record);
            return Ok(record);
        }
        Ok(None) => {}
        Err(e) => {
            warn!("Ignoring saved calibration: {}", e);
            console::line(&format!("Error loading calibration: {e}"));
        }
    }

    console::line("No saved calibration found. Starting calibration...");
    console::blank();

    loop {
        match calibrator.run(source) {
            Err(e @ Error::DegenerateCalibration { .. }) => {
                warn!("Repeating calibration: {}", e);
                console::line("Turn your head further toward each target. Starting calibration again...");
                console::blank();
            }
            result => return result,
        }
    }
}
