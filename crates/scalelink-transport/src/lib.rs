//! Serial line transport for retail scale protocols.
//!
//! The scale speaks a half-duplex request/response protocol over an RS-232
//! line with fixed 8N1 framing. This crate is the lowest layer of scalelink:
//! it owns the port handle and exposes the handful of primitives the
//! protocol engine needs (single-byte reads with timeout, draining whatever
//! is buffered, clearing driver buffers).
//!
//! Everything above builds on the [`SerialLink`] trait so the protocol can
//! be exercised without hardware.

pub mod error;
pub mod serial;
pub mod traits;

#[cfg(any(test, feature = "scripted"))]
pub mod scripted;

pub use error::{Result, TransportError};
pub use serial::{available_ports, PortInfo, SerialConfig, SerialPortLink, SerialPortOpener};
pub use traits::{LinkOpener, SerialLink};
