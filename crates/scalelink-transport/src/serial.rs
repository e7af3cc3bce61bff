use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, Parity, SerialPort, SerialPortType, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{LinkOpener, SerialLink};

/// Line parameters for the scale's serial port.
///
/// Framing is fixed at 8 data bits, no parity, 1 stop bit; only the port,
/// baud rate and timeouts are configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// OS port name (`/dev/ttyUSB0`, `COM3`, ...).
    pub port: String,
    /// Line speed in baud. Default: 9600.
    pub baud_rate: u32,
    /// Timeout for a blocking read. Default: 2 s.
    pub read_timeout: Duration,
    /// Timeout for a blocking write. Default: 3 s.
    pub write_timeout: Duration,
}

impl SerialConfig {
    /// Default line speed of the scale.
    pub const DEFAULT_BAUD_RATE: u32 = 9600;

    /// Config for `port` with default speed and timeouts.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port_name().to_string(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_secs(3),
        }
    }
}

#[cfg(windows)]
fn default_port_name() -> &'static str {
    "COM3"
}

#[cfg(not(windows))]
fn default_port_name() -> &'static str {
    "/dev/ttyUSB0"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeoutMode {
    Read,
    Write,
}

/// A [`SerialLink`] backed by an OS serial port.
///
/// The driver exposes a single timeout, so the link switches it between
/// the read and write values as the direction of traffic changes.
pub struct SerialPortLink {
    port: Box<dyn SerialPort>,
    name: String,
    read_timeout: Duration,
    write_timeout: Duration,
    mode: TimeoutMode,
}

impl SerialPortLink {
    /// Open `config.port` with 8N1 framing.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        info!(port = %config.port, baud = config.baud_rate, "opened serial port (8N1)");

        Ok(Self {
            port,
            name: config.port.clone(),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            mode: TimeoutMode::Read,
        })
    }

    fn use_timeout(&mut self, mode: TimeoutMode) -> Result<()> {
        if self.mode != mode {
            let timeout = match mode {
                TimeoutMode::Read => self.read_timeout,
                TimeoutMode::Write => self.write_timeout,
            };
            self.port.set_timeout(timeout)?;
            self.mode = mode;
        }
        Ok(())
    }
}

impl SerialLink for SerialPortLink {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        self.use_timeout(TimeoutMode::Read)?;
        let mut byte = [0u8; 1];
        loop {
            match self.port.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => return Ok(None),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn read_available(&mut self, dst: &mut Vec<u8>) -> Result<usize> {
        let waiting = self.port.bytes_to_read()? as usize;
        if waiting == 0 {
            return Ok(0);
        }
        self.use_timeout(TimeoutMode::Read)?;

        let mut chunk = vec![0u8; waiting];
        loop {
            match self.port.read(&mut chunk) {
                Ok(n) => {
                    dst.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => return Ok(0),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.use_timeout(TimeoutMode::Write)?;
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.port.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }

    fn bytes_to_read(&self) -> Result<u32> {
        Ok(self.port.bytes_to_read()?)
    }

    fn clear_input(&self) -> Result<()> {
        Ok(self.port.clear(ClearBuffer::Input)?)
    }

    fn clear_output(&self) -> Result<()> {
        Ok(self.port.clear(ClearBuffer::Output)?)
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.port.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

impl Drop for SerialPortLink {
    fn drop(&mut self) {
        debug!(port = %self.name, "closing serial port");
    }
}

impl std::fmt::Debug for SerialPortLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortLink")
            .field("port", &self.name)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

/// Opens [`SerialPortLink`]s from the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialPortOpener;

impl LinkOpener for SerialPortOpener {
    fn open(&mut self, config: &SerialConfig) -> Result<Box<dyn SerialLink>> {
        Ok(Box::new(SerialPortLink::open(config)?))
    }
}

/// A serial port visible to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: &'static str,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

/// Enumerate serial ports.
///
/// On macOS only the `/dev/cu.*` call-out devices are listed; the
/// `/dev/tty.*` twins block on open waiting for carrier detect.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .filter(|_p| {
            #[cfg(target_os = "macos")]
            {
                !_p.port_name.starts_with("/dev/tty.")
            }
            #[cfg(not(target_os = "macos"))]
            {
                true
            }
        })
        .map(|p| match p.port_type {
            SerialPortType::UsbPort(usb) => PortInfo {
                name: p.port_name,
                kind: "usb",
                manufacturer: usb.manufacturer,
                product: usb.product,
                serial_number: usb.serial_number,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
            },
            other => PortInfo {
                name: p.port_name,
                kind: match other {
                    SerialPortType::BluetoothPort => "bluetooth",
                    SerialPortType::PciPort => "pci",
                    _ => "unknown",
                },
                manufacturer: None,
                product: None,
                serial_number: None,
                vid: None,
                pid: None,
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_scale_line() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.read_timeout, Duration::from_secs(2));
        assert_eq!(config.write_timeout, Duration::from_secs(3));
    }

    #[test]
    fn new_overrides_port_only() {
        let config = SerialConfig::new("/dev/ttyS7");
        assert_eq!(config.port, "/dev/ttyS7");
        assert_eq!(config.baud_rate, SerialConfig::DEFAULT_BAUD_RATE);
    }

    #[test]
    #[cfg(unix)]
    fn open_missing_port_reports_port_name() {
        let config = SerialConfig::new(format!(
            "/dev/scalelink-missing-{}",
            std::process::id()
        ));
        let err = SerialPortLink::open(&config).unwrap_err();
        match err {
            TransportError::Open { port, .. } => assert_eq!(port, config.port),
            other => panic!("expected open error, got {other:?}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn opener_propagates_open_failure() {
        let config = SerialConfig::new("/dev/scalelink-definitely-not-here");
        let mut opener = SerialPortOpener;
        assert!(matches!(
            opener.open(&config),
            Err(TransportError::Open { .. })
        ));
    }
}
