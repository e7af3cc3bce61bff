use std::fmt;
use std::io;

use scalelink_session::ScaleError;
use scalelink_transport::TransportError;

// Process exit codes. 124 matches timeout(1).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const DEVICE_ERROR: i32 = 69;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = io_code(err.kind());
    CliError::new(code, format!("{context}: {err}"))
}

fn io_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    }
}

fn serial_code(err: &serialport::Error) -> i32 {
    match err.kind() {
        serialport::ErrorKind::InvalidInput => USAGE,
        serialport::ErrorKind::Io(kind) => match io_code(kind) {
            INTERNAL => TRANSPORT_ERROR,
            code => code,
        },
        _ => TRANSPORT_ERROR,
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::Open { ref source, .. } | TransportError::Serial(ref source) => {
            CliError::new(serial_code(source), format!("{context}: {err}"))
        }
        TransportError::Closed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
    }
}

pub fn scale_error(context: &str, err: ScaleError) -> CliError {
    match err {
        ScaleError::Io(err) => transport_error(context, err),
        ScaleError::Timeout => CliError::new(TIMEOUT, format!("{context}: {err}")),
        ScaleError::NotReady | ScaleError::ProtocolViolation(_) => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        ScaleError::DeviceError { .. } => CliError::new(DEVICE_ERROR, format!("{context}: {err}")),
        ScaleError::Validation(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        ScaleError::EmptyResult => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}
