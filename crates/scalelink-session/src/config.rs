use std::time::Duration;

use scalelink_transport::SerialConfig;

/// How long the handshake waits for a ready byte.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// Probe and command writes per exchange.
pub const DEFAULT_ATTEMPTS: u32 = 3;
/// Pause after each write so the device can react.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);
/// Pause between draining passes.
pub const DEFAULT_DRAIN_POLL_DELAY: Duration = Duration::from_millis(10);
/// Minimum spacing between reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(30);
/// Failed reconnects before a warning is logged.
pub const DEFAULT_RECONNECT_CEILING: u32 = 5;

/// Everything a scale session needs to know, with the device's defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleConfig {
    /// Line parameters (port, baud rate, read/write timeouts).
    pub serial: SerialConfig,
    pub handshake_timeout: Duration,
    pub probe_attempts: u32,
    pub command_attempts: u32,
    pub settle_delay: Duration,
    pub drain_poll_delay: Duration,
    pub reconnect_interval: Duration,
    pub reconnect_ceiling: u32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self::with_serial(SerialConfig::default())
    }
}

impl ScaleConfig {
    /// Defaults on the given port.
    pub fn new(port: impl Into<String>) -> Self {
        Self::with_serial(SerialConfig::new(port))
    }

    pub fn with_serial(serial: SerialConfig) -> Self {
        Self {
            serial,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            probe_attempts: DEFAULT_ATTEMPTS,
            command_attempts: DEFAULT_ATTEMPTS,
            settle_delay: DEFAULT_SETTLE_DELAY,
            drain_poll_delay: DEFAULT_DRAIN_POLL_DELAY,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            reconnect_ceiling: DEFAULT_RECONNECT_CEILING,
        }
    }
}
