//! Constants used throughout the application

use std::time::Duration;

/// Size of one OpenTrack UDP datagram: six native-endian `f64` fields
pub const PACKET_SIZE: usize = 48;

/// Number of `f64` fields in a telemetry packet (x, y, z, yaw, pitch, roll)
pub const PACKET_FIELDS: usize = 6;

/// Default address the telemetry socket binds to
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Default OpenTrack UDP output port
pub const DEFAULT_UDP_PORT: u16 = 5005;

/// Receive timeout used while tracking and sampling
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Length of the sampling window for each calibration step
pub const DEFAULT_SAMPLE_WINDOW: Duration = Duration::from_secs(2);

/// Delay before sampling when no terminal is attached
pub const DEFAULT_AUTO_PROCEED_DELAY: Duration = Duration::from_secs(3);

/// How often blocking prompts and delays check for a shutdown request
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Screen size assumed when the display cannot be queried
pub const DEFAULT_SCREEN_WIDTH: u32 = 1920;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 1080;

/// Process-identity file read by `headmouse toggle` / `headmouse recalibrate`
pub const DEFAULT_PID_FILE: &str = "/tmp/opentrack_mouse.pid";

/// Directory under the user configuration root holding persisted state
pub const CONFIG_DIR_NAME: &str = "headmouse";

/// File name of the persisted calibration record
pub const CALIBRATION_FILE_NAME: &str = "calibration.json";
