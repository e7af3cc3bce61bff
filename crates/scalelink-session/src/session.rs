use std::fmt;
use std::time::{Duration, Instant};

use scalelink_codec::{command_name, interpret_trailer, DEVICE_ERROR, PROBE, READY};
use scalelink_transport::{LinkOpener, SerialLink, SerialPortOpener};
use tracing::{debug, info, warn};

use crate::config::ScaleConfig;
use crate::error::{Result, ScaleError};

/// Where a [`Session`] is in its lifecycle.
///
/// ```text
/// Disconnected ──connect──▶ Handshaking ──ready byte──▶ Ready
///      ▲                         │                        │
///      └──── failure ────────────┘      timeout/protocol  ▼
///      ▲                                              Faulted
///      └────────────── i/o error (Ready or Faulted) ──────┘
/// ```
///
/// `Faulted` keeps the port open; only an explicit `connect` leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Handshaking,
    Ready,
    Faulted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Handshaking => "handshaking",
            SessionState::Ready => "ready",
            SessionState::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// Exclusive owner of the serial link to one scale.
///
/// All operations take `&mut self`, so at most one exchange is ever in
/// flight. Hosts sharing a session across threads wrap it in a mutex.
pub struct Session {
    pub(crate) config: ScaleConfig,
    opener: Box<dyn LinkOpener>,
    pub(crate) link: Option<Box<dyn SerialLink>>,
    pub(crate) state: SessionState,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("port", &self.config.serial.port)
            .field("state", &self.state)
            .field("link_open", &self.link.is_some())
            .finish()
    }
}

impl Session {
    /// A disconnected session that opens links through `opener`.
    pub fn new(config: ScaleConfig, opener: impl LinkOpener + 'static) -> Self {
        Self {
            config,
            opener: Box::new(opener),
            link: None,
            state: SessionState::Disconnected,
        }
    }

    /// A disconnected session on a real serial port.
    pub fn serial(config: ScaleConfig) -> Self {
        Self::new(config, SerialPortOpener)
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True only after a successful handshake with the link still open.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready && self.link.is_some()
    }

    /// Open the port and run the handshake.
    ///
    /// Any existing link is closed first. On failure the new link is
    /// closed too and the session ends up `Disconnected`.
    pub fn connect(&mut self) -> Result<()> {
        self.close_link();
        self.state = SessionState::Handshaking;
        info!(
            port = %self.config.serial.port,
            baud = self.config.serial.baud_rate,
            "connecting to scale"
        );

        let mut link = match self.opener.open(&self.config.serial) {
            Ok(link) => link,
            Err(err) => {
                self.state = SessionState::Disconnected;
                warn!(port = %self.config.serial.port, error = %err, "failed to open port");
                return Err(err.into());
            }
        };

        match handshake(link.as_mut(), self.config.handshake_timeout) {
            Ok(()) => {
                self.link = Some(link);
                self.state = SessionState::Ready;
                info!(port = %self.config.serial.port, "scale ready");
                Ok(())
            }
            Err(err) => {
                drop(link);
                self.state = SessionState::Disconnected;
                warn!(port = %self.config.serial.port, error = %err, "handshake failed");
                Err(err)
            }
        }
    }

    /// Close the link if open. Idempotent.
    pub fn disconnect(&mut self) {
        self.close_link();
        self.state = SessionState::Disconnected;
    }

    /// Record a failure that happened while talking to the device.
    pub(crate) fn record_failure(&mut self, err: &ScaleError) {
        if !err.clears_readiness() {
            return;
        }
        if matches!(err, ScaleError::Io(_)) {
            self.close_link();
            self.state = SessionState::Disconnected;
        } else if self.state == SessionState::Ready {
            self.state = SessionState::Faulted;
        }
    }

    fn close_link(&mut self) {
        if let Some(link) = self.link.take() {
            info!(port = %link.name(), "port closed");
        }
    }
}

/// Probe the device and wait for it to report ready.
///
/// `0x80` means ready. `0xEE` must be followed by `0x80`, anything else
/// fails the handshake. Other bytes are discarded until the deadline.
fn handshake(link: &mut dyn SerialLink, timeout: Duration) -> Result<()> {
    link.clear_input()?;
    link.clear_output()?;
    link.write_all(&[PROBE])?;

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        let Some(byte) = link.read_byte()? else {
            continue;
        };
        match byte {
            READY => return Ok(()),
            DEVICE_ERROR => {
                let mut sequence = vec![DEVICE_ERROR];
                sequence.extend(link.read_byte()?);
                if interpret_trailer(&sequence).ready {
                    debug!("device reported an error, then ready");
                    return Ok(());
                }
                return Err(ScaleError::DeviceError {
                    command: command_name(PROBE),
                });
            }
            other => debug!(byte = format_args!("{other:#04x}"), "discarding byte"),
        }
    }
    Err(ScaleError::Timeout)
}
