//! Line-oriented status output for the person in front of the screen.
//!
//! Diagnostics go through `log`; this module only prints the prompts and
//! progress lines a user follows during calibration and startup.

use crate::{
    calibration::CalibrationRecord, constants::INPUT_POLL_INTERVAL, mapping::ScreenGeometry,
    telemetry::OrientationSample,
};
use std::{
    io::{self, BufRead, IsTerminal, Write},
    time::Duration,
};

/// Print one line
pub fn line(message: &str) {
    println!("{message}");
}

/// Print an empty line
pub fn blank() {
    println!();
}

/// True if standard input is attached to an interactive terminal
#[must_use]
pub fn stdin_is_terminal() -> bool {
    io::stdin().is_terminal()
}

/// Print `prompt` and block until the user presses ENTER or `stop` returns
/// true. Returns whether ENTER was pressed.
///
/// Standard input is polled so a shutdown request is noticed even though
/// signal handlers restart interrupted reads.
///
/// # Errors
///
/// Returns an error if standard input cannot be polled or read.
pub fn wait_for_enter_unless(prompt: &str, stop: impl Fn() -> bool) -> io::Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;

    loop {
        if stop() {
            println!();
            return Ok(false);
        }
        if stdin_readable(INPUT_POLL_INTERVAL)? {
            let mut buf = String::new();
            io::stdin().lock().read_line(&mut buf)?;
            return Ok(true);
        }
    }
}

fn stdin_readable(timeout: Duration) -> io::Result<bool> {
    let mut fd = libc::pollfd {
        fd: libc::STDIN_FILENO,
        events: libc::POLLIN,
        revents: 0,
    };
    let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
    // SAFETY: `fd` is a single valid pollfd and the count says so.
    let ready = unsafe { libc::poll(&mut fd, 1, millis) };
    if ready < 0 {
        let err = io::Error::last_os_error();
        // A signal arrived; the caller re-checks its stop condition
        return if err.kind() == io::ErrorKind::Interrupted {
            Ok(false)
        } else {
            Err(err)
        };
    }
    Ok(ready > 0)
}

/// Print a boxed heading
pub fn banner(title: &str) {
    let width = 60;
    println!("╔{}╗", "═".repeat(width));
    println!("║ {title:<w$}║", w = width - 1);
    println!("╚{}╝", "═".repeat(width));
    println!();
}

/// Print a ruled heading
pub fn rule(title: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
    println!();
}

/// Report the averaged reading of a calibration step
pub fn recorded(sample: OrientationSample) {
    println!("✓ Recorded: yaw={:+.1}°, pitch={:+.1}°", sample.yaw, sample.pitch);
    println!();
}

/// Print the center and ranges of a calibration
pub fn calibration_summary(record: &CalibrationRecord) {
    println!(
        "Center: yaw={:+.1}°, pitch={:+.1}°",
        record.center_yaw, record.center_pitch
    );
    println!("Yaw range: ±{:.1}°", record.yaw_range);
    println!("Pitch range: ±{:.1}°", record.pitch_range);
    println!();
}

/// Print the detected screen size
pub fn screen(geometry: ScreenGeometry) {
    println!("Screen: {}x{}", geometry.width, geometry.height);
    println!();
}

/// Print how to control the running tracker
pub fn control_help() {
    println!("Control commands:");
    println!("  Toggle tracking: headmouse toggle");
    println!("  Recalibrate:     headmouse recalibrate");
    println!();
}

/// Report the tracking state after a toggle
pub fn tracking_status(enabled: bool) {
    let status = if enabled { "ENABLED" } else { "DISABLED" };
    println!();
    println!("Head tracking: {status}");
}
