use scalelink_codec::CodecError;
use scalelink_transport::TransportError;

/// Errors returned by scale sessions and the client facade.
#[derive(Debug, thiserror::Error)]
pub enum ScaleError {
    /// No successful handshake, or readiness was lost.
    #[error("scale is not ready")]
    NotReady,

    /// The device did not answer within the bounded wait.
    #[error("timed out waiting for the scale")]
    Timeout,

    /// Serial open, read or write failure.
    #[error("serial i/o error: {0}")]
    Io(#[from] TransportError),

    /// The answer matches none of ack, error or a record of the expected size.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The device answered with the error sentinel.
    #[error("scale rejected {command}")]
    DeviceError { command: &'static str },

    /// A record supplied by the caller cannot be encoded.
    #[error("invalid record: {0}")]
    Validation(#[from] CodecError),

    /// The device answered with a well-formed but unused record.
    #[error("no record stored at this slot")]
    EmptyResult,
}

impl ScaleError {
    /// Whether this failure leaves the session unable to send commands.
    pub fn clears_readiness(&self) -> bool {
        matches!(
            self,
            ScaleError::Timeout | ScaleError::Io(_) | ScaleError::ProtocolViolation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScaleError>;
