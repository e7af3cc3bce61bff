//! Serial protocol engine for retail weighing scales.
//!
//! scalelink talks to a scale over an RS-232 line: it wakes the device,
//! sends single-byte commands with fixed-size payloads, and decodes the
//! binary records it answers with (products, sales totals, live status).
//!
//! # Crate Structure
//!
//! - [`transport`]: serial link abstraction and the OS serial port
//! - [`codec`]: byte-exact record encoding (PLU, totals, status, BCD, CP866)
//! - [`session`]: handshake, command exchange, reconnect policy and the
//!   [`ScaleClient`](session::ScaleClient) facade

/// Re-export transport types.
pub mod transport {
    pub use scalelink_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use scalelink_codec::*;
}

/// Re-export session types.
pub mod session {
    pub use scalelink_session::*;
}
