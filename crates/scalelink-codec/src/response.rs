use bytes::Bytes;

use crate::command::{DEVICE_ERROR, READY};

/// Every length-bearing response starts with one status/echo byte that is
/// not part of the record.
pub const STATUS_PREFIX_LEN: usize = 1;

/// A well-formed answer from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Ready sentinel, no record.
    Ack,
    /// Error sentinel.
    Error,
    /// Record of exactly the expected length, status prefix removed.
    Payload(Bytes),
}

/// How a sentinel sequence should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerKind {
    /// The device reported ready.
    Ready,
    /// The device reported that the last command failed.
    DeviceError,
    /// Neither sentinel.
    Unrecognized,
}

/// Outcome of [`interpret_trailer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trailer {
    /// Whether the device can accept the next command.
    pub ready: bool,
    pub kind: TrailerKind,
}

/// Interpret a sentinel sequence.
///
/// `0x80` is ready. `0xEE` is a device error; the device is ready again
/// only if the byte after it is `0x80`. Used for the handshake and for the
/// tail of every command response.
pub fn interpret_trailer(bytes: &[u8]) -> Trailer {
    match bytes {
        [READY, ..] => Trailer {
            ready: true,
            kind: TrailerKind::Ready,
        },
        [DEVICE_ERROR, READY, ..] => Trailer {
            ready: true,
            kind: TrailerKind::DeviceError,
        },
        [DEVICE_ERROR, ..] => Trailer {
            ready: false,
            kind: TrailerKind::DeviceError,
        },
        _ => Trailer {
            ready: false,
            kind: TrailerKind::Unrecognized,
        },
    }
}

/// Drop the leading status byte from a raw record response.
pub fn strip_status_prefix(raw: &[u8]) -> &[u8] {
    raw.get(STATUS_PREFIX_LEN..).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_byte_is_ready() {
        let trailer = interpret_trailer(&[0x80]);
        assert!(trailer.ready);
        assert_eq!(trailer.kind, TrailerKind::Ready);
    }

    #[test]
    fn error_then_ready_restores_readiness() {
        let trailer = interpret_trailer(&[0xEE, 0x80]);
        assert!(trailer.ready);
        assert_eq!(trailer.kind, TrailerKind::DeviceError);
    }

    #[test]
    fn error_without_ready_stays_not_ready() {
        assert!(!interpret_trailer(&[0xEE]).ready);
        let trailer = interpret_trailer(&[0xEE, 0x13]);
        assert!(!trailer.ready);
        assert_eq!(trailer.kind, TrailerKind::DeviceError);
    }

    #[test]
    fn other_bytes_are_unrecognized() {
        assert_eq!(interpret_trailer(&[]).kind, TrailerKind::Unrecognized);
        assert_eq!(interpret_trailer(&[0x00]).kind, TrailerKind::Unrecognized);
        assert!(!interpret_trailer(&[0x06, 0x80]).ready);
    }

    #[test]
    fn strip_status_prefix_removes_one_byte() {
        assert_eq!(strip_status_prefix(&[0x00, 1, 2, 3]), &[1, 2, 3]);
        assert!(strip_status_prefix(&[0x00]).is_empty());
        assert!(strip_status_prefix(&[]).is_empty());
    }
}
