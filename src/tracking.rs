//! The tracking loop: telemetry in, cursor moves out.
//!
//! Each iteration first services a pending recalibration, then waits a
//! bounded time for one sample. Samples are always drained from the socket,
//! but only move the cursor while tracking is enabled.

use crate::{
    calibration::{CalibrationRecord, Calibrator, StepGate},
    console,
    constants::DEFAULT_POLL_INTERVAL,
    control::ControlState,
    cursor_control::CursorEffector,
    error::{Error, Result},
    mapping::{map_to_screen, ScreenGeometry},
    telemetry::{OrientationSample, Reception, TelemetrySource},
};
use log::{debug, error, info, warn};
use std::{sync::Arc, thread, time::Duration};

/// Fixed parameters of the tracking loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingSettings {
    /// Screen the cursor is mapped onto
    pub geometry: ScreenGeometry,
    /// Receive timeout per iteration
    pub poll_interval: Duration,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            geometry: ScreenGeometry::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Counters describing what the loop did, mostly for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingStats {
    pub samples: u64,
    pub moves: u64,
    pub malformed: u64,
    pub recalibrations: u64,
}

/// Drives cursor control until shutdown is requested
pub struct TrackingLoop<S, E, G>
where
    S: TelemetrySource,
    E: CursorEffector,
    G: StepGate,
{
    source: S,
    effector: E,
    calibrator: Calibrator<G>,
    control: Arc<ControlState>,
    settings: TrackingSettings,
    calibration: CalibrationRecord,
    last_enabled: bool,
    stats: TrackingStats,
}

impl<S, E, G> TrackingLoop<S, E, G>
where
    S: TelemetrySource,
    E: CursorEffector,
    G: StepGate,
{
    /// Create a loop starting from an existing calibration
    pub fn new(
        source: S,
        effector: E,
        calibrator: Calibrator<G>,
        control: Arc<ControlState>,
        settings: TrackingSettings,
        calibration: CalibrationRecord,
    ) -> Self {
        Self {
            source,
            effector,
            calibrator,
            control,
            settings,
            calibration,
            // Initial control state; earlier toggles get reported on the first iteration
            last_enabled: true,
            stats: TrackingStats::default(),
        }
    }

    /// Calibration currently in use
    pub const fn calibration(&self) -> &CalibrationRecord {
        &self.calibration
    }

    /// The cursor effector
    pub const fn effector(&self) -> &E {
        &self.effector
    }

    /// What the loop has done so far
    pub const fn stats(&self) -> TrackingStats {
        self.stats
    }

    /// Run until the control state requests shutdown.
    ///
    /// # Errors
    ///
    /// Currently returns Ok(()) always: malformed, missing or unmappable input
    /// is absorbed. Returns Result for API consistency.
    pub fn run(&mut self) -> Result<()> {
        info!("Entering tracking loop");

        while !self.control.shutdown_requested() {
            self.iterate();
        }

        info!(
            "Tracking loop stopped: {} samples, {} moves, {} malformed, {} recalibrations",
            self.stats.samples, self.stats.moves, self.stats.malformed, self.stats.recalibrations
        );
        Ok(())
    }

    /// One pass: recalibrate if asked, then handle at most one datagram.
    pub fn iterate(&mut self) {
        if self.control.take_recalibration_request() {
            self.recalibrate();
            return;
        }

        self.report_toggle();

        match self.source.receive(self.settings.poll_interval) {
            Ok(Reception::Sample(sample)) => {
                self.stats.samples += 1;
                if self.control.is_enabled() {
                    self.apply(sample);
                }
            }
            Ok(Reception::Timeout) => {}
            Ok(Reception::Malformed { .. }) => self.stats.malformed += 1,
            Err(e) => {
                warn!("Telemetry receive failed: {}", e);
                thread::sleep(self.settings.poll_interval);
            }
        }
    }

    fn report_toggle(&mut self) {
        let enabled = self.control.is_enabled();
        if enabled != self.last_enabled {
            info!("Head tracking {}", if enabled { "enabled" } else { "disabled" });
            console::tracking_status(enabled);
            self.last_enabled = enabled;
        }
    }

    fn apply(&mut self, sample: OrientationSample) {
        match map_to_screen(sample, self.settings.geometry, &self.calibration) {
            Ok(point) => {
                if let Err(e) = self.effector.move_to(point.x, point.y) {
                    debug!("Cursor move failed: {}", e);
                } else {
                    self.stats.moves += 1;
                }
            }
            Err(e @ Error::DegenerateCalibration { .. }) => {
                error!("{}; forcing recalibration", e);
                self.control.request_recalibration();
            }
            Err(e) => debug!("Skipping sample: {}", e),
        }
    }

    fn recalibrate(&mut self) {
        info!("Recalibration requested");
        console::rule("RECALIBRATING...");

        match self.calibrator.run(&mut self.source) {
            Ok(record) => {
                self.calibration = record;
                self.stats.recalibrations += 1;
                console::line("✓ Recalibration complete! Resuming tracking...");
            }
            Err(Error::Interrupted) => info!("Recalibration abandoned for shutdown"),
            Err(e) => {
                if e.is_calibration_failure() {
                    warn!("Recalibration failed: {}", e);
                } else {
                    error!("Recalibration aborted: {}", e);
                }
                console::line("❌ Recalibration failed! Using old calibration...");
            }
        }
        console::blank();

        if self.control.take_recalibration_request() {
            info!("Ignoring recalibration request received during calibration");
        }
    }
}
