//! OpenTrack UDP telemetry source.
//!
//! OpenTrack's "UDP over network" output sends one datagram per frame holding
//! six native-endian `f64` values: x, y, z, yaw, pitch, roll. Only yaw and
//! pitch are used for cursor control.

use crate::{
    constants::{PACKET_FIELDS, PACKET_SIZE},
    error::Result,
};
use log::{debug, info, trace};
use std::{
    io::ErrorKind,
    net::{SocketAddr, UdpSocket},
    time::Duration,
};

/// A single head orientation reading in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationSample {
    /// Horizontal head rotation
    pub yaw: f64,
    /// Vertical head rotation
    pub pitch: f64,
}

impl OrientationSample {
    /// Create a new sample
    #[must_use]
    pub const fn new(yaw: f64, pitch: f64) -> Self {
        Self { yaw, pitch }
    }

    /// True if both angles are finite numbers
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite()
    }
}

/// Fully decoded OpenTrack packet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryPacket {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl TelemetryPacket {
    /// Decode a datagram. Returns `None` unless it is exactly [`PACKET_SIZE`] bytes.
    #[must_use]
    pub fn decode(datagram: &[u8]) -> Option<Self> {
        if datagram.len() != PACKET_SIZE {
            return None;
        }

        let mut fields = [0.0_f64; PACKET_FIELDS];
        for (field, chunk) in fields.iter_mut().zip(datagram.chunks_exact(8)) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            *field = f64::from_ne_bytes(bytes);
        }

        let [x, y, z, yaw, pitch, roll] = fields;
        Some(Self { x, y, z, yaw, pitch, roll })
    }

    /// Encode into the wire layout
    #[must_use]
    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut out = [0u8; PACKET_SIZE];
        let fields = [self.x, self.y, self.z, self.yaw, self.pitch, self.roll];
        for (chunk, field) in out.chunks_exact_mut(8).zip(fields) {
            chunk.copy_from_slice(&field.to_ne_bytes());
        }
        out
    }

    /// The part of the packet used by calibration and mapping
    #[must_use]
    pub const fn orientation(&self) -> OrientationSample {
        OrientationSample::new(self.yaw, self.pitch)
    }
}

/// Outcome of a single bounded receive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reception {
    /// A well-formed packet arrived
    Sample(OrientationSample),
    /// Nothing arrived before the timeout
    Timeout,
    /// A datagram of the wrong size arrived and was dropped
    Malformed {
        /// Size of the dropped datagram
        len: usize,
    },
}

/// Anything that can deliver orientation samples with a bounded wait
pub trait TelemetrySource {
    /// Wait up to `timeout` for one datagram.
    ///
    /// # Errors
    ///
    /// Returns an error only for unexpected I/O failures; timeouts and
    /// malformed datagrams are reported through [`Reception`].
    fn receive(&mut self, timeout: Duration) -> Result<Reception>;
}

/// UDP socket bound to the OpenTrack output endpoint
pub struct UdpTelemetrySource {
    socket: UdpSocket,
    current_timeout: Option<Duration>,
    // One byte larger than a packet so oversized datagrams are detected
    // instead of being silently truncated to a valid length.
    buffer: [u8; PACKET_SIZE + 1],
}

impl UdpTelemetrySource {
    /// Bind the telemetry socket
    ///
    /// # Errors
    ///
    /// Returns an error if the address is unavailable.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        info!("Listening for OpenTrack telemetry on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            current_timeout: None,
            buffer: [0u8; PACKET_SIZE + 1],
        })
    }

    /// Address the socket is actually bound to
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot report its address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        if self.current_timeout != Some(timeout) {
            // A zero read timeout is rejected by the OS
            let effective = timeout.max(Duration::from_millis(1));
            self.socket.set_read_timeout(Some(effective))?;
            self.current_timeout = Some(timeout);
        }
        Ok(())
    }
}

impl TelemetrySource for UdpTelemetrySource {
    fn receive(&mut self, timeout: Duration) -> Result<Reception> {
        self.set_timeout(timeout)?;

        match self.socket.recv_from(&mut self.buffer) {
            Ok((len, _from)) => match TelemetryPacket::decode(&self.buffer[..len]) {
                Some(packet) => {
                    trace!("yaw={:+.2} pitch={:+.2}", packet.yaw, packet.pitch);
                    Ok(Reception::Sample(packet.orientation()))
                }
                None => {
                    debug!("Dropping malformed datagram of {} bytes", len);
                    Ok(Reception::Malformed { len })
                }
            },
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                Ok(Reception::Timeout)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Drain `source` for `window`, returning every sample received in order.
///
/// # Errors
///
/// Propagates I/O failures from the source.
pub fn collect_samples<S: TelemetrySource + ?Sized>(
    source: &mut S,
    window: Duration,
    poll_interval: Duration,
) -> Result<Vec<OrientationSample>> {
    let mut samples = Vec::new();
    let start = std::time::Instant::now();

    while start.elapsed() < window {
        if let Reception::Sample(sample) = source.receive(poll_interval)? {
            samples.push(sample);
        }
    }

    debug!("Collected {} samples in {:?}", samples.len(), window);
    Ok(samples)
}
