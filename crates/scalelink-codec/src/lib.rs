//! Byte-exact codec for the retail scale's serial protocol.
//!
//! Everything here is pure: no I/O, no clocks. Records are decoded from and
//! encoded to fixed-size little-endian frames:
//! - PLU product records (100-byte read form, 83-byte write form)
//! - Total sales counters (40 bytes) and live status (15 bytes)
//! - Packed BCD dates, timestamps and expiry fields
//! - Fixed-width CP866 names with optional certification trailers
//!
//! Response sentinels (`0x80` ready, `0xEE` device error) and the leading
//! status byte of record responses are handled by [`response`].

pub mod bcd;
pub mod command;
pub mod digits;
pub mod error;
pub mod expiry;
pub mod plu;
pub mod response;
pub mod sales;
pub mod settings;
pub mod status;
pub mod text;

pub use command::{command_name, CommandFrame, DEVICE_ERROR, PROBE, READY};
pub use error::{CodecError, Result};
pub use expiry::Expiry;
pub use plu::{PluEntry, PluRecord};
pub use response::{
    interpret_trailer, strip_status_prefix, Response, Trailer, TrailerKind, STATUS_PREFIX_LEN,
};
pub use sales::TotalSales;
pub use settings::{SettingsBlock, SettingsKind};
pub use status::{LiveStatus, StatusFlags};
pub use text::{Certification, NameLine};
