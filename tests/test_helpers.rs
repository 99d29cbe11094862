//! Helper types shared by the integration tests

#![allow(dead_code)]

use headmouse::{
    calibration::{CalibrationRecord, CalibrationSettings, CalibrationStep, StepGate},
    control::ControlState,
    cursor_control::CursorEffector,
    telemetry::{OrientationSample, Reception, TelemetrySource},
    Error, Result,
};
use std::{
    cell::Cell,
    collections::VecDeque,
    rc::Rc,
    sync::Arc,
    thread,
    time::Duration,
};

/// Short calibration timing so the procedure finishes quickly
pub fn quick_settings() -> CalibrationSettings {
    CalibrationSettings {
        sample_window: Duration::from_millis(15),
        poll_interval: Duration::from_millis(1),
    }
}

/// Calibration used by the mapping scenarios
pub fn reference_calibration() -> CalibrationRecord {
    CalibrationRecord {
        center_yaw: 0.0,
        center_pitch: 0.0,
        yaw_range: 30.0,
        pitch_range: 20.0,
    }
}

/// Per-step readings producing a calibration of center (2, 1), yaw ±25, pitch ±15
pub fn step_readings() -> [(CalibrationStep, OrientationSample); 5] {
    [
        (CalibrationStep::Center, OrientationSample::new(2.0, 1.0)),
        (CalibrationStep::TopLeft, OrientationSample::new(-20.0, 11.0)),
        (CalibrationStep::TopRight, OrientationSample::new(27.0, 12.0)),
        (CalibrationStep::BottomLeft, OrientationSample::new(-18.0, -14.0)),
        (CalibrationStep::BottomRight, OrientationSample::new(25.0, -13.0)),
    ]
}

/// Expected result of calibrating with [`step_readings`]
pub fn expected_calibration() -> CalibrationRecord {
    CalibrationRecord {
        center_yaw: 2.0,
        center_pitch: 1.0,
        yaw_range: 25.0,
        pitch_range: 15.0,
    }
}

/// Source replaying a fixed list of receptions, then requesting shutdown
pub struct ScriptedSource {
    items: VecDeque<Reception>,
    control: Arc<ControlState>,
}

impl ScriptedSource {
    pub fn new(items: Vec<Reception>, control: &Arc<ControlState>) -> Self {
        Self {
            items: items.into(),
            control: Arc::clone(control),
        }
    }
}

impl TelemetrySource for ScriptedSource {
    fn receive(&mut self, _timeout: Duration) -> Result<Reception> {
        Ok(self.items.pop_front().unwrap_or_else(|| {
            self.control.request_shutdown();
            Reception::Timeout
        }))
    }
}

/// Current calibration step, shared between a gate and a source
pub type SharedStep = Rc<Cell<Option<CalibrationStep>>>;

/// Gate that publishes which step is about to be sampled
pub struct SharedStepGate {
    step: SharedStep,
    calls: Rc<Cell<usize>>,
    on_wait: Option<Arc<ControlState>>,
}

impl SharedStepGate {
    pub fn new(step: &SharedStep) -> Self {
        Self {
            step: Rc::clone(step),
            calls: Rc::new(Cell::new(0)),
            on_wait: None,
        }
    }

    /// Request a recalibration each time a step starts, as a signal would
    pub fn requesting_recalibration(mut self, control: &Arc<ControlState>) -> Self {
        self.on_wait = Some(Arc::clone(control));
        self
    }

    pub fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }
}

impl StepGate for SharedStepGate {
    fn wait(&mut self, step: CalibrationStep, _window: Duration) -> Result<()> {
        self.step.set(Some(step));
        self.calls.set(self.calls.get() + 1);
        if let Some(control) = &self.on_wait {
            control.request_recalibration();
        }
        Ok(())
    }
}

/// Source that emits the reading for whichever step the gate announced.
///
/// Steps without a reading (or no step yet) time out. Every call sleeps for
/// one millisecond so time-based sampling windows see a realistic rate.
/// Each time the gate returns to the center step a new attempt starts and the
/// next reading set (if any) takes over.
pub struct StepAwareSource {
    step: SharedStep,
    attempts: Vec<Vec<(CalibrationStep, OrientationSample)>>,
    attempt: usize,
    last_step: Option<CalibrationStep>,
    calls: usize,
    shutdown_after: Option<(usize, Arc<ControlState>)>,
}

impl StepAwareSource {
    pub fn new(step: &SharedStep, readings: &[(CalibrationStep, OrientationSample)]) -> Self {
        Self {
            step: Rc::clone(step),
            attempts: vec![readings.to_vec()],
            attempt: 0,
            last_step: None,
            calls: 0,
            shutdown_after: None,
        }
    }

    /// Readings used by the next calibration attempt
    pub fn then_readings(mut self, readings: &[(CalibrationStep, OrientationSample)]) -> Self {
        self.attempts.push(readings.to_vec());
        self
    }

    /// Request shutdown once `calls` receives have happened
    pub fn shutdown_after(mut self, calls: usize, control: &Arc<ControlState>) -> Self {
        self.shutdown_after = Some((calls, Arc::clone(control)));
        self
    }
}

impl TelemetrySource for StepAwareSource {
    fn receive(&mut self, timeout: Duration) -> Result<Reception> {
        self.calls += 1;
        if let Some((limit, control)) = &self.shutdown_after {
            if self.calls >= *limit {
                control.request_shutdown();
            }
        }

        thread::sleep(timeout.min(Duration::from_millis(1)));

        let current = self.step.get();
        if current == Some(CalibrationStep::Center)
            && self.last_step.is_some_and(|last| last != CalibrationStep::Center)
        {
            self.attempt = (self.attempt + 1).min(self.attempts.len() - 1);
        }
        self.last_step = current;

        let reading = current.and_then(|current| {
            self.attempts[self.attempt]
                .iter()
                .find(|(step, _)| *step == current)
                .map(|(_, sample)| *sample)
        });
        Ok(reading.map_or(Reception::Timeout, Reception::Sample))
    }
}

/// Cursor effector recording every move
#[derive(Default)]
pub struct RecordingCursor {
    pub moves: Vec<(f64, f64)>,
    pub fail: bool,
}

impl RecordingCursor {
    pub fn failing() -> Self {
        Self {
            moves: Vec::new(),
            fail: true,
        }
    }
}

impl CursorEffector for RecordingCursor {
    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        if self.fail {
            return Err(Error::CursorControl("display went away".to_string()));
        }
        self.moves.push((x, y));
        Ok(())
    }
}
