use crate::error::Result;
use crate::serial::SerialConfig;

/// A connected serial line.
///
/// The scale protocol never needs more than these primitives: it probes the
/// device byte by byte, drains whatever the device has buffered, and resets
/// the driver buffers between exchanges.
pub trait SerialLink: Send {
    /// Read a single byte, waiting up to the configured read timeout.
    ///
    /// Returns `Ok(None)` when the timeout elapses with nothing received.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Move every byte currently buffered by the driver into `dst`.
    ///
    /// Never blocks waiting for new data. Returns the number of bytes moved.
    fn read_available(&mut self, dst: &mut Vec<u8>) -> Result<usize>;

    /// Write all of `bytes`, retrying short writes.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Number of received bytes waiting in the driver's input buffer.
    fn bytes_to_read(&self) -> Result<u32>;

    /// Discard everything in the input buffer.
    fn clear_input(&self) -> Result<()>;

    /// Discard everything in the output buffer.
    fn clear_output(&self) -> Result<()>;

    /// Block until the output buffer has been transmitted.
    fn flush(&mut self) -> Result<()>;

    /// Port name for diagnostics.
    fn name(&self) -> String;
}

/// Opens serial links on demand.
///
/// A session re-opens its link on every (re)connect, so it holds an opener
/// rather than a link.
pub trait LinkOpener: Send {
    /// Open a link with the given line parameters.
    fn open(&mut self, config: &SerialConfig) -> Result<Box<dyn SerialLink>>;
}
