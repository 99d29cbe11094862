//! Guided five-point calibration.
//!
//! The user looks at the center and the four corners of the screen in turn.
//! Telemetry is averaged over a fixed window for each fixation and the means
//! are reduced to a center point and a symmetric range per axis.

use crate::{
    console,
    constants::{DEFAULT_POLL_INTERVAL, DEFAULT_SAMPLE_WINDOW, INPUT_POLL_INTERVAL},
    control::ControlState,
    error::{Error, Result},
    store::CalibrationStore,
    telemetry::{collect_samples, OrientationSample, TelemetrySource},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

/// Personal head-to-screen mapping parameters, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub center_yaw: f64,
    pub center_pitch: f64,
    pub yaw_range: f64,
    pub pitch_range: f64,
}

impl CalibrationRecord {
    /// Check that the record can drive the coordinate mapper.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateCalibration`] unless both ranges are strictly
    /// positive and every field is finite.
    pub fn validate(&self) -> Result<()> {
        let ranges_ok = self.yaw_range > 0.0
            && self.pitch_range > 0.0
            && self.yaw_range.is_finite()
            && self.pitch_range.is_finite();
        let center_ok = self.center_yaw.is_finite() && self.center_pitch.is_finite();

        if ranges_ok && center_ok {
            Ok(())
        } else {
            Err(Error::DegenerateCalibration {
                yaw_range: self.yaw_range,
                pitch_range: self.pitch_range,
            })
        }
    }

    /// The calibrated center as a sample
    #[must_use]
    pub const fn center(&self) -> OrientationSample {
        OrientationSample::new(self.center_yaw, self.center_pitch)
    }
}

/// One fixation of the calibration sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl CalibrationStep {
    /// Steps in the order they are performed
    pub const ALL: [Self; 5] = [
        Self::Center,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Stable identifier
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::TopLeft => "top_left",
            Self::TopRight => "top_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomRight => "bottom_right",
        }
    }

    /// What the user is asked to do
    #[must_use]
    pub const fn instruction(self) -> &'static str {
        match self {
            Self::Center => "Look at the CENTER of your screen",
            Self::TopLeft => "Look at the TOP LEFT corner",
            Self::TopRight => "Look at the TOP RIGHT corner",
            Self::BottomLeft => "Look at the BOTTOM LEFT corner",
            Self::BottomRight => "Look at the BOTTOM RIGHT corner",
        }
    }
}

/// Arithmetic mean of the finite samples, or `None` if there are none
#[must_use]
pub fn mean_orientation(samples: &[OrientationSample]) -> Option<OrientationSample> {
    let (count, yaw, pitch) = samples
        .iter()
        .filter(|s| s.is_finite())
        .fold((0_usize, 0.0, 0.0), |(n, yaw, pitch), s| (n + 1, yaw + s.yaw, pitch + s.pitch));
    if count == 0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)] // sample counts are tiny
    let n = count as f64;
    Some(OrientationSample::new(yaw / n, pitch / n))
}

/// Per-step mean readings
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepMeans {
    pub center: OrientationSample,
    pub top_left: OrientationSample,
    pub top_right: OrientationSample,
    pub bottom_left: OrientationSample,
    pub bottom_right: OrientationSample,
}

impl StepMeans {
    /// Record the mean for one step
    pub fn set(&mut self, step: CalibrationStep, mean: OrientationSample) {
        let slot = match step {
            CalibrationStep::Center => &mut self.center,
            CalibrationStep::TopLeft => &mut self.top_left,
            CalibrationStep::TopRight => &mut self.top_right,
            CalibrationStep::BottomLeft => &mut self.bottom_left,
            CalibrationStep::BottomRight => &mut self.bottom_right,
        };
        *slot = mean;
    }

    /// Reduce the five fixations to a calibration record.
    ///
    /// Yaw range comes from the two top corners, pitch range from the two
    /// left corners. The right-hand pitch readings are not used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateCalibration`] if a range comes out zero or
    /// non-finite.
    pub fn aggregate(&self) -> Result<CalibrationRecord> {
        let center = self.center;

        let yaw_left = (self.top_left.yaw - center.yaw).abs();
        let yaw_right = (self.top_right.yaw - center.yaw).abs();

        let pitch_up = (self.top_left.pitch - center.pitch).abs();
        let pitch_down = (self.bottom_left.pitch - center.pitch).abs();

        let record = CalibrationRecord {
            center_yaw: center.yaw,
            center_pitch: center.pitch,
            yaw_range: yaw_left.max(yaw_right),
            pitch_range: pitch_up.max(pitch_down),
        };
        record.validate()?;
        Ok(record)
    }
}

/// Decides when the user is ready for a step to be sampled
pub trait StepGate {
    /// Block until sampling for `step` may begin.
    ///
    /// # Errors
    ///
    /// Returns an error if the user cannot be asked.
    fn wait(&mut self, step: CalibrationStep, sample_window: Duration) -> Result<()>;
}

/// How the console gate decides a step may start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Wait for the user to press ENTER
    Terminal,
    /// Sleep for a fixed time (unattended operation)
    Delay(Duration),
}

/// Console-driven gate: ENTER on a terminal, a fixed delay otherwise.
///
/// With a control state attached, a shutdown request ends the wait early
/// with [`Error::Interrupted`].
#[derive(Debug, Clone)]
pub struct ConsoleGate {
    mode: GateMode,
    control: Option<Arc<ControlState>>,
}

impl ConsoleGate {
    /// Gate with the given mode and no shutdown check
    #[must_use]
    pub const fn new(mode: GateMode) -> Self {
        Self { mode, control: None }
    }

    /// Pick the mode matching how standard input is attached
    #[must_use]
    pub fn detect(auto_proceed_delay: Duration) -> Self {
        if console::stdin_is_terminal() {
            Self::new(GateMode::Terminal)
        } else {
            Self::new(GateMode::Delay(auto_proceed_delay))
        }
    }

    /// Stop waiting once `control` requests shutdown
    #[must_use]
    pub fn interruptible(mut self, control: &Arc<ControlState>) -> Self {
        self.control = Some(Arc::clone(control));
        self
    }

    #[must_use]
    pub const fn mode(&self) -> GateMode {
        self.mode
    }

    fn stop_requested(&self) -> bool {
        self.control.as_ref().is_some_and(|c| c.shutdown_requested())
    }

    fn sleep(&self, delay: Duration) -> Result<()> {
        let deadline = Instant::now() + delay;
        loop {
            if self.stop_requested() {
                return Err(Error::Interrupted);
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Ok(());
            }
            thread::sleep(left.min(INPUT_POLL_INTERVAL));
        }
    }
}

impl StepGate for ConsoleGate {
    fn wait(&mut self, _step: CalibrationStep, sample_window: Duration) -> Result<()> {
        match self.mode {
            GateMode::Terminal => {
                let prompt = format!(
                    "Press ENTER when ready, then hold your gaze for {} seconds...",
                    sample_window.as_secs_f64()
                );
                if console::wait_for_enter_unless(&prompt, || self.stop_requested())? {
                    Ok(())
                } else {
                    Err(Error::Interrupted)
                }
            }
            GateMode::Delay(delay) => {
                console::line(&format!("Starting in {} seconds...", delay.as_secs_f64()));
                self.sleep(delay)
            }
        }
    }
}

/// Timing of the calibration procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationSettings {
    /// How long each fixation is sampled
    pub sample_window: Duration,
    /// Receive timeout while sampling
    pub poll_interval: Duration,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            sample_window: DEFAULT_SAMPLE_WINDOW,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Runs the guided calibration and persists its result
pub struct Calibrator<G: StepGate> {
    gate: G,
    store: CalibrationStore,
    settings: CalibrationSettings,
    control: Option<Arc<ControlState>>,
}

impl<G: StepGate> Calibrator<G> {
    /// Create a new calibrator
    pub const fn new(gate: G, store: CalibrationStore, settings: CalibrationSettings) -> Self {
        Self {
            gate,
            store,
            settings,
            control: None,
        }
    }

    /// Abandon a session between steps once `control` requests shutdown
    #[must_use]
    pub fn interruptible(mut self, control: &Arc<ControlState>) -> Self {
        self.control = Some(Arc::clone(control));
        self
    }

    /// Store the calibration is saved to
    pub const fn store(&self) -> &CalibrationStore {
        &self.store
    }

    /// Run all five steps against `source` and return the new calibration.
    ///
    /// The source is borrowed exclusively for the whole session, so nothing
    /// else can consume telemetry meanwhile. A save failure is reported but
    /// the record is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoData`] if any step received no samples,
    /// [`Error::DegenerateCalibration`] if the fixations span no range and
    /// [`Error::Interrupted`] if shutdown was requested. Nothing is persisted
    /// in those cases.
    pub fn run<S: TelemetrySource + ?Sized>(&mut self, source: &mut S) -> Result<CalibrationRecord> {
        info!("Starting calibration");
        console::banner("CALIBRATION - 5 Steps");

        let mut means = StepMeans::default();
        for step in CalibrationStep::ALL {
            self.check_shutdown()?;
            console::line(&format!("Step: {}", step.instruction()));
            self.gate.wait(step, self.settings.sample_window)?;
            self.check_shutdown()?;

            let samples = collect_samples(source, self.settings.sample_window, self.settings.poll_interval)?;
            self.check_shutdown()?;
            let Some(mean) = mean_orientation(&samples) else {
                console::line("ERROR: No data from OpenTrack!");
                return Err(Error::NoData { step: step.label() });
            };

            info!("Step {}: {} samples", step.label(), samples.len());
            console::recorded(mean);
            means.set(step, mean);
        }

        let record = match means.aggregate() {
            Ok(record) => record,
            Err(e) => {
                console::line("ERROR: Head movement range too small, calibration rejected!");
                return Err(e);
            }
        };

        console::line("Calibration complete!");
        console::calibration_summary(&record);

        match self.store.save(&record) {
            Ok(()) => console::line(&format!("✓ Calibration saved to {}", self.store.path().display())),
            Err(e) => {
                warn!("Continuing with unsaved calibration: {}", e);
                console::line(&format!("Error saving calibration: {e}"));
            }
        }

        Ok(record)
    }

    fn check_shutdown(&self) -> Result<()> {
        if self.control.as_ref().is_some_and(|c| c.shutdown_requested()) {
            info!("Calibration interrupted");
            console::line("Calibration interrupted.");
            return Err(Error::Interrupted);
        }
        Ok(())
    }
}
