//! Command bytes, sentinels and record lengths.
//!
//! Every exchange starts with a single command byte, optionally followed by
//! a fixed-size payload. The device answers with a sentinel or a status
//! byte followed by a fixed-size record.

use bytes::Bytes;

/// Wake/probe byte written before every command and during the handshake.
pub const PROBE: u8 = 0x01;

/// Device is idle and accepts a new command.
pub const READY: u8 = 0x80;

/// The previous command failed on the device.
pub const DEVICE_ERROR: u8 = 0xEE;

pub const READ_PLU: u8 = 0x81;
pub const WRITE_PLU: u8 = 0x82;
pub const READ_MESSAGE: u8 = 0x83;
pub const WRITE_MESSAGE: u8 = 0x84;
pub const READ_TOTAL_SALES: u8 = 0x85;
pub const RESET_TOTAL_SALES: u8 = 0x86;
pub const READ_STATUS: u8 = 0x89;
pub const WRITE_USER_SETTINGS: u8 = 0x8A;
pub const BIND_PLU_TO_KEY: u8 = 0x8B;
pub const WRITE_LOGO: u8 = 0x8C;
pub const DELETE_PLU: u8 = 0x8D;
pub const DELETE_MESSAGE: u8 = 0x8E;
pub const RESET_PLU_TOTALS: u8 = 0x92;
pub const WRITE_CERT_LOGO: u8 = 0x93;
pub const READ_USER_SETTINGS: u8 = 0x95;
pub const READ_PLU_BY_KEY: u8 = 0x96;
pub const READ_LOGO: u8 = 0x97;
pub const READ_FACTORY_SETTINGS: u8 = 0x9B;

/// PLU record as read from the device.
pub const PLU_READ_LEN: usize = 100;
/// PLU record as written to the device (no statistics tail).
pub const PLU_WRITE_LEN: usize = 83;
pub const TOTAL_SALES_LEN: usize = 40;
pub const STATUS_LEN: usize = 15;
pub const USER_SETTINGS_LEN: usize = 9;
pub const FACTORY_SETTINGS_LEN: usize = 13;
/// Size of a PLU number argument.
pub const PLU_ID_LEN: usize = 4;

/// Returns a human-readable name for a command byte.
pub fn command_name(command: u8) -> &'static str {
    match command {
        PROBE => "PROBE",
        READ_PLU => "READ_PLU",
        WRITE_PLU => "WRITE_PLU",
        READ_MESSAGE => "READ_MESSAGE",
        WRITE_MESSAGE => "WRITE_MESSAGE",
        READ_TOTAL_SALES => "READ_TOTAL_SALES",
        RESET_TOTAL_SALES => "RESET_TOTAL_SALES",
        READ_STATUS => "READ_STATUS",
        WRITE_USER_SETTINGS => "WRITE_USER_SETTINGS",
        BIND_PLU_TO_KEY => "BIND_PLU_TO_KEY",
        WRITE_LOGO => "WRITE_LOGO",
        DELETE_PLU => "DELETE_PLU",
        DELETE_MESSAGE => "DELETE_MESSAGE",
        RESET_PLU_TOTALS => "RESET_PLU_TOTALS",
        WRITE_CERT_LOGO => "WRITE_CERT_LOGO",
        READ_USER_SETTINGS => "READ_USER_SETTINGS",
        READ_PLU_BY_KEY => "READ_PLU_BY_KEY",
        READ_LOGO => "READ_LOGO",
        READ_FACTORY_SETTINGS => "READ_FACTORY_SETTINGS",
        _ => "UNKNOWN",
    }
}

/// A single command to send to the scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    command: u8,
    payload: Bytes,
    expected_len: usize,
}

impl CommandFrame {
    /// Create a frame. `expected_len == 0` means the device only acks.
    pub fn new(command: u8, payload: impl Into<Bytes>, expected_len: usize) -> Self {
        Self {
            command,
            payload: payload.into(),
            expected_len,
        }
    }

    /// A read-style command answered by a record of `expected_len` bytes.
    pub fn read(command: u8, payload: impl Into<Bytes>, expected_len: usize) -> Self {
        Self::new(command, payload, expected_len)
    }

    /// An ack-style command answered by a bare sentinel.
    pub fn ack(command: u8, payload: impl Into<Bytes>) -> Self {
        Self::new(command, payload, 0)
    }

    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Expected record length after the status prefix is stripped.
    pub fn expected_len(&self) -> usize {
        self.expected_len
    }

    /// True for read-style commands.
    pub fn expects_record(&self) -> bool {
        self.expected_len > 0
    }

    /// Human-readable command name for diagnostics.
    pub fn name(&self) -> &'static str {
        command_name(self.command)
    }
}
