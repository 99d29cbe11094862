//! Tests for choosing between a saved calibration and a fresh one at startup

mod test_helpers;

use headmouse::{
    app::load_or_calibrate,
    calibration::{CalibrationStep, Calibrator},
    control::ControlState,
    store::CalibrationStore,
    telemetry::OrientationSample,
    Error,
};
use std::{cell::Cell, fs, rc::Rc, sync::Arc};
use tempfile::TempDir;
use test_helpers::{
    expected_calibration, quick_settings, reference_calibration, step_readings, SharedStepGate, StepAwareSource,
};

#[test]
fn test_saved_calibration_skips_procedure() {
    let dir = TempDir::new().unwrap();
    let store = CalibrationStore::new(dir.path().join("calibration.json"));
    store.save(&reference_calibration()).unwrap();

    let step = Rc::new(Cell::new(None));
    let gate = SharedStepGate::new(&step);
    let gate_calls = gate.calls();
    let mut source = StepAwareSource::new(&step, &step_readings());
    let mut calibrator = Calibrator::new(gate, store, quick_settings());

    let record = load_or_calibrate(&mut calibrator, &mut source).unwrap();

    assert_eq!(record, reference_calibration());
    assert_eq!(gate_calls.get(), 0);
}

#[test]
fn test_corrupt_file_triggers_calibration() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibration.json");
    fs::write(&path, "{\"center_yaw\": 1.0}").unwrap();

    let step = Rc::new(Cell::new(None));
    let mut source = StepAwareSource::new(&step, &step_readings());
    let mut calibrator = Calibrator::new(SharedStepGate::new(&step), CalibrationStore::new(&path), quick_settings());

    let record = load_or_calibrate(&mut calibrator, &mut source).unwrap();

    assert_eq!(record, expected_calibration());
    // The corrupt file has been replaced
    assert_eq!(CalibrationStore::new(&path).load().unwrap(), Some(expected_calibration()));
}

#[test]
fn test_no_data_on_first_run_is_fatal() {
    let dir = TempDir::new().unwrap();
    let step = Rc::new(Cell::new(None));
    let mut source = StepAwareSource::new(&step, &[]);
    let mut calibrator = Calibrator::new(
        SharedStepGate::new(&step),
        CalibrationStore::new(dir.path().join("calibration.json")),
        quick_settings(),
    );

    let result = load_or_calibrate(&mut calibrator, &mut source);

    assert!(matches!(result, Err(Error::NoData { .. })));
    assert!(!dir.path().join("calibration.json").exists());
}

#[test]
fn test_motionless_first_attempt_is_repeated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibration.json");
    let still = OrientationSample::new(3.0, 3.0);
    let motionless: Vec<_> = CalibrationStep::ALL.iter().map(|s| (*s, still)).collect();

    let step = Rc::new(Cell::new(None));
    let gate = SharedStepGate::new(&step);
    let gate_calls = gate.calls();
    let mut source = StepAwareSource::new(&step, &motionless).then_readings(&step_readings());
    let mut calibrator = Calibrator::new(gate, CalibrationStore::new(&path), quick_settings());

    let record = load_or_calibrate(&mut calibrator, &mut source).unwrap();

    assert_eq!(record, expected_calibration());
    assert_eq!(gate_calls.get(), 10);
    assert_eq!(CalibrationStore::new(&path).load().unwrap(), Some(expected_calibration()));
}

#[test]
fn test_shutdown_abandons_first_calibration() {
    let dir = TempDir::new().unwrap();
    let control = Arc::new(ControlState::new());
    control.request_shutdown();

    let step = Rc::new(Cell::new(None));
    let gate = SharedStepGate::new(&step);
    let gate_calls = gate.calls();
    let mut source = StepAwareSource::new(&step, &step_readings());
    let mut calibrator = Calibrator::new(
        gate,
        CalibrationStore::new(dir.path().join("calibration.json")),
        quick_settings(),
    )
    .interruptible(&control);

    let result = load_or_calibrate(&mut calibrator, &mut source);

    assert!(matches!(result, Err(Error::Interrupted)));
    assert_eq!(gate_calls.get(), 0);
    assert!(!dir.path().join("calibration.json").exists());
}
