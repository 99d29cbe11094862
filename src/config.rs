//! Configuration management for the headmouse tracker

use crate::{
    calibration::CalibrationSettings,
    constants::{
        DEFAULT_AUTO_PROCEED_DELAY, DEFAULT_BIND_ADDRESS, DEFAULT_PID_FILE, DEFAULT_POLL_INTERVAL,
        DEFAULT_SAMPLE_WINDOW, DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH, DEFAULT_UDP_PORT,
    },
    mapping::ScreenGeometry,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Telemetry socket configuration
    pub telemetry: TelemetryConfig,

    /// Calibration procedure configuration
    pub calibration: CalibrationConfig,

    /// Screen configuration
    pub screen: ScreenConfig,

    /// External control configuration
    pub control: ControlConfig,
}

/// Telemetry socket configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Address the UDP socket binds to
    pub bind_address: String,

    /// UDP port OpenTrack sends to
    pub port: u16,

    /// Receive timeout in milliseconds
    pub poll_interval_ms: u64,
}

/// Calibration procedure configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Sampling window per step in milliseconds
    pub sample_window_ms: u64,

    /// Delay before each step when no terminal is attached, in milliseconds
    pub auto_proceed_delay_ms: u64,

    /// Calibration file, defaults to the per-user config directory
    pub file: Option<PathBuf>,
}

/// Screen configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Width assumed if the display cannot be queried
    pub fallback_width: u32,

    /// Height assumed if the display cannot be queried
    pub fallback_height: u32,
}

/// External control configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Process-identity file for `headmouse toggle` / `headmouse recalibrate`
    pub pid_file: PathBuf,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_UDP_PORT,
            poll_interval_ms: duration_ms(DEFAULT_POLL_INTERVAL),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            sample_window_ms: duration_ms(DEFAULT_SAMPLE_WINDOW),
            auto_proceed_delay_ms: duration_ms(DEFAULT_AUTO_PROCEED_DELAY),
            file: None,
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            fallback_width: DEFAULT_SCREEN_WIDTH,
            fallback_height: DEFAULT_SCREEN_HEIGHT,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            pid_file: PathBuf::from(DEFAULT_PID_FILE),
        }
    }
}

#[allow(clippy::cast_possible_truncation)] // constants are a few seconds at most
const fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or written.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        if self.telemetry.port == 0 {
            return Err(Error::ConfigError("UDP port must be greater than 0".to_string()));
        }
        if self.telemetry.poll_interval_ms == 0 {
            return Err(Error::ConfigError("Poll interval must be greater than 0".to_string()));
        }

        if self.calibration.sample_window_ms == 0 {
            return Err(Error::ConfigError("Sample window must be greater than 0".to_string()));
        }

        if self.screen.fallback_width == 0 || self.screen.fallback_height == 0 {
            return Err(Error::ConfigError("Fallback screen size must be non-zero".to_string()));
        }

        if self.control.pid_file.as_os_str().is_empty() {
            return Err(Error::ConfigError("PID file path must not be empty".to_string()));
        }

        Ok(())
    }

    /// Socket address for the telemetry listener
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the bind address is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.telemetry.bind_address.parse().map_err(|e| {
            Error::ConfigError(format!("Invalid bind address '{}': {e}", self.telemetry.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.telemetry.port))
    }

    /// Receive timeout used by the tracking loop and calibration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry.poll_interval_ms)
    }

    /// Calibration timing derived from this configuration
    #[must_use]
    pub const fn calibration_settings(&self) -> CalibrationSettings {
        CalibrationSettings {
            sample_window: Duration::from_millis(self.calibration.sample_window_ms),
            poll_interval: self.poll_interval(),
        }
    }

    /// Delay used instead of ENTER when no terminal is attached
    #[must_use]
    pub const fn auto_proceed_delay(&self) -> Duration {
        Duration::from_millis(self.calibration.auto_proceed_delay_ms)
    }

    /// Screen size used when the display cannot be queried
    #[must_use]
    pub const fn fallback_geometry(&self) -> ScreenGeometry {
        ScreenGeometry::new(self.screen.fallback_width, self.screen.fallback_height)
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# headmouse configuration

# OpenTrack "UDP over network" output
telemetry:
  bind_address: "127.0.0.1"
  port: 5005
  poll_interval_ms: 10

# Guided calibration
calibration:
  sample_window_ms: 2000
  auto_proceed_delay_ms: 3000
  # file: "/home/me/.config/headmouse/calibration.json"

# Used when the X11 display cannot be queried
screen:
  fallback_width: 1920
  fallback_height: 1080

# Process identity for `headmouse toggle` / `headmouse recalibrate`
control:
  pid_file: "/tmp/opentrack_mouse.pid"
"#;
