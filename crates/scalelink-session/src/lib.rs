//! Protocol engine for retail scales on a serial line.
//!
//! Layers, leaves first:
//! - [`Session`]: owns the link, runs the handshake, tracks readiness
//! - [`Session::exchange`]: one command/response round trip
//! - [`ReconnectController`]: rate-limited retries once readiness is lost
//! - [`ScaleClient`]: record-level operations (PLU, totals, status, settings)
//!
//! Everything is blocking and single-threaded per scale.

pub mod client;
pub mod config;
pub mod error;
mod exchange;
pub mod reconnect;
pub mod session;

pub use client::ScaleClient;
pub use config::ScaleConfig;
pub use error::{Result, ScaleError};
pub use reconnect::{ReconnectController, ReconnectOutcome};
pub use session::{Session, SessionState};
