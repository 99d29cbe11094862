//! External control of a running tracker.
//!
//! A running tracker is steered with POSIX signals: SIGUSR1 toggles cursor
//! control and SIGUSR2 requests a recalibration. Handlers only flip atomics
//! in a [`ControlState`]; the tracking loop reads and clears them between
//! receives. SIGINT/SIGTERM request a clean shutdown the same way.
//!
//! The process-identity file lets `headmouse toggle` and
//! `headmouse recalibrate` find the running tracker.

use crate::error::{Error, Result};
use log::{debug, info};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
};

/// Flags shared between signal handlers and the tracking loop.
///
/// Signal context only sets or flips flags; the tracking loop is the only
/// reader and the only one clearing `recalibration_requested`.
#[derive(Debug)]
pub struct ControlState {
    enabled: AtomicBool,
    recalibration_requested: AtomicBool,
    shutdown_requested: AtomicBool,
}

impl ControlState {
    /// Tracking enabled, nothing pending
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            recalibration_requested: AtomicBool::new(false),
            shutdown_requested: AtomicBool::new(false),
        }
    }

    /// Flip tracking on/off and return the new state
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::SeqCst)
    }

    /// Whether samples should move the cursor
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Ask for a recalibration. Repeated requests collapse into one.
    pub fn request_recalibration(&self) {
        self.recalibration_requested.store(true, Ordering::SeqCst);
    }

    /// Consume a pending recalibration request
    pub fn take_recalibration_request(&self) -> bool {
        self.recalibration_requested.swap(false, Ordering::SeqCst)
    }

    /// Whether a recalibration request is waiting
    pub fn recalibration_pending(&self) -> bool {
        self.recalibration_requested.load(Ordering::SeqCst)
    }

    /// Ask the tracking loop to exit
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
    }

    /// Whether the tracking loop should exit
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

/// The state signal handlers act on. Set once per process.
static SIGNAL_TARGET: OnceLock<Arc<ControlState>> = OnceLock::new();

extern "C" fn handle_signal(signal: libc::c_int) {
    // Only atomic operations here: no allocation, locking or I/O.
    let Some(control) = SIGNAL_TARGET.get() else {
        return;
    };
    match signal {
        libc::SIGUSR1 => {
            control.toggle();
        }
        libc::SIGUSR2 => control.request_recalibration(),
        libc::SIGINT | libc::SIGTERM => control.request_shutdown(),
        _ => {}
    }
}

fn install(signal: libc::c_int) -> Result<()> {
    let handler = handle_signal as extern "C" fn(libc::c_int);
    // SAFETY: the handler is async-signal-safe, it only touches atomics
    // behind a `OnceLock` that is initialised before any handler is installed.
    let previous = unsafe { libc::signal(signal, handler as libc::sighandler_t) };
    if previous == libc::SIG_ERR {
        return Err(Error::Signal(format!(
            "Failed to install handler for signal {signal}: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

fn register_target(control: &Arc<ControlState>) -> Result<()> {
    let registered = SIGNAL_TARGET.get_or_init(|| Arc::clone(control));
    if Arc::ptr_eq(registered, control) {
        Ok(())
    } else {
        Err(Error::Signal("Signal handlers already bound to another control state".to_string()))
    }
}

/// Route SIGUSR1 (toggle) and SIGUSR2 (recalibrate) to `control`.
///
/// # Errors
///
/// Returns [`Error::Signal`] if handlers are already bound to a different
/// state or the OS refuses the handler.
pub fn install_control_handlers(control: &Arc<ControlState>) -> Result<()> {
    register_target(control)?;
    install(libc::SIGUSR1)?;
    install(libc::SIGUSR2)?;
    debug!("Installed SIGUSR1/SIGUSR2 handlers");
    Ok(())
}

/// Route SIGINT and SIGTERM to `control` as shutdown requests.
///
/// # Errors
///
/// Same as [`install_control_handlers`].
pub fn install_shutdown_handlers(control: &Arc<ControlState>) -> Result<()> {
    register_target(control)?;
    install(libc::SIGINT)?;
    install(libc::SIGTERM)?;
    debug!("Installed SIGINT/SIGTERM handlers");
    Ok(())
}

/// Command sent to a running tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Enable or disable cursor control
    Toggle,
    /// Run the calibration again
    Recalibrate,
}

impl ControlCommand {
    /// Signal that carries this command
    #[must_use]
    pub const fn signal(self) -> libc::c_int {
        match self {
            Self::Toggle => libc::SIGUSR1,
            Self::Recalibrate => libc::SIGUSR2,
        }
    }
}

/// Process-identity file: program path on the first line, PID on the second
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Pid file at `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the current process
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_current(&self) -> Result<()> {
        let program = std::env::args().next().unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
        self.write(&program, std::process::id())
    }

    /// Record `program` running as `pid`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, program: &str, pid: u32) -> Result<()> {
        fs::write(&self.path, format!("{program}\n{pid}"))
            .map_err(|e| Error::ControlError(format!("Failed to write {}: {e}", self.path.display())))?;
        info!("Wrote process identity to {}", self.path.display());
        Ok(())
    }

    /// Read the recorded PID
    ///
    /// # Errors
    ///
    /// Returns [`Error::ControlError`] if the file is missing or malformed.
    pub fn read_pid(&self) -> Result<u32> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::ControlError(format!(
                "Cannot read {} (is headmouse running?): {e}",
                self.path.display()
            ))
        })?;

        content
            .lines()
            .nth(1)
            .and_then(|line| line.trim().parse::<u32>().ok())
            .filter(|pid| *pid > 0)
            .ok_or_else(|| Error::ControlError(format!("No valid PID in {}", self.path.display())))
    }

    /// Delete the file if it still names the current process
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn remove_if_current(&self) -> Result<()> {
        match self.read_pid() {
            Ok(pid) if pid == std::process::id() => {
                fs::remove_file(&self.path)?;
                debug!("Removed {}", self.path.display());
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Deliver `command` to the tracker recorded in `pid_file`.
///
/// # Errors
///
/// Returns [`Error::ControlError`] if the pid file is unusable or the process
/// cannot be signalled.
pub fn send_command(pid_file: &PidFile, command: ControlCommand) -> Result<u32> {
    let pid = pid_file.read_pid()?;
    let target = libc::pid_t::try_from(pid)
        .map_err(|_| Error::ControlError(format!("PID {pid} out of range")))?;

    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(target, command.signal()) };
    if rc != 0 {
        return Err(Error::ControlError(format!(
            "Failed to signal process {pid}: {}",
            std::io::Error::last_os_error()
        )));
    }

    info!("Sent {:?} to process {}", command, pid);
    Ok(pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_initial_state() {
        let state = ControlState::new();
        assert!(state.is_enabled());
        assert!(!state.recalibration_pending());
        assert!(!state.shutdown_requested());
    }

    #[test]
    fn test_double_toggle_restores_state() {
        let state = ControlState::new();
        assert!(!state.toggle());
        assert!(!state.is_enabled());
        assert!(state.toggle());
        assert!(state.is_enabled());
        assert!(!state.recalibration_pending());
    }

    #[test]
    fn test_recalibration_requests_collapse() {
        let state = ControlState::new();
        state.request_recalibration();
        state.request_recalibration();
        assert!(state.take_recalibration_request());
        assert!(!state.take_recalibration_request());
    }

    #[test]
    fn test_pid_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let pid_file = PidFile::new(dir.path().join("tracker.pid"));
        pid_file.write("/usr/bin/headmouse", 4242).unwrap();
        assert_eq!(pid_file.read_pid().unwrap(), 4242);
    }

    #[test]
    fn test_pid_file_errors() {
        let dir = TempDir::new().unwrap();
        let pid_file = PidFile::new(dir.path().join("missing.pid"));
        assert!(matches!(pid_file.read_pid(), Err(Error::ControlError(_))));

        fs::write(pid_file.path(), "headmouse\nnot-a-pid").unwrap();
        assert!(pid_file.read_pid().is_err());
    }

    #[test]
    fn test_remove_only_own_pid_file() {
        let dir = TempDir::new().unwrap();
        let pid_file = PidFile::new(dir.path().join("tracker.pid"));

        pid_file.write("other", std::process::id() + 1).unwrap();
        pid_file.remove_if_current().unwrap();
        assert!(pid_file.path().exists());

        pid_file.write_current().unwrap();
        pid_file.remove_if_current().unwrap();
        assert!(!pid_file.path().exists());
    }

    #[test]
    fn test_command_signals() {
        assert_eq!(ControlCommand::Toggle.signal(), libc::SIGUSR1);
        assert_eq!(ControlCommand::Recalibrate.signal(), libc::SIGUSR2);
    }
}
