//! One command/response round trip.
//!
//! The scale buffers asynchronously and needs to be woken before every
//! command, so a single exchange is:
//!
//! 1. clear the input buffer
//! 2. write the probe byte until something arrives (bounded attempts)
//! 3. drain and discard the probe answer
//! 4. write the command byte and payload until something arrives
//! 5. drain the answer and flush
//! 6. classify it as ack, device error or a record of the expected size

use std::thread;
use std::time::Duration;

use bytes::Bytes;
use scalelink_codec::{
    interpret_trailer, strip_status_prefix, CommandFrame, Response, Trailer, DEVICE_ERROR, PROBE,
    READY,
};
use scalelink_transport::SerialLink;
use tracing::{debug, warn};

use crate::config::ScaleConfig;
use crate::error::{Result, ScaleError};
use crate::session::Session;

impl Session {
    /// Send `frame` and collect the device's answer.
    ///
    /// Fails with [`ScaleError::NotReady`] without touching the port when
    /// the session is not ready. Timeouts and malformed answers fault the
    /// session; i/o errors close the link.
    pub fn exchange(&mut self, frame: &CommandFrame) -> Result<Response> {
        if !self.is_ready() {
            warn!(command = frame.name(), state = %self.state, "scale not ready");
            return Err(ScaleError::NotReady);
        }

        let result = match self.link.as_deref_mut() {
            Some(link) => transfer(link, frame, &self.config),
            None => Err(ScaleError::NotReady),
        };

        if let Err(err) = &result {
            warn!(command = frame.name(), error = %err, "exchange failed");
            self.record_failure(err);
        }
        result
    }
}

fn transfer(
    link: &mut dyn SerialLink,
    frame: &CommandFrame,
    config: &ScaleConfig,
) -> Result<Response> {
    link.clear_input()?;

    write_until_answer(link, config.probe_attempts, config.settle_delay, |link| {
        link.write_all(&[PROBE])?;
        Ok(())
    })?;
    let wake = drain(link, config.drain_poll_delay)?;
    if wake.is_empty() {
        return Err(ScaleError::Timeout);
    }
    debug!(answer = %hex::encode(&wake), "probe answered");

    debug!(
        command = frame.name(),
        payload = %hex::encode(frame.payload()),
        "sending command"
    );
    write_until_answer(link, config.command_attempts, config.settle_delay, |link| {
        link.write_all(&[frame.command()])?;
        thread::sleep(config.settle_delay);
        if !frame.payload().is_empty() {
            link.write_all(frame.payload())?;
        }
        Ok(())
    })?;
    let raw = drain(link, config.drain_poll_delay)?;
    link.flush()?;
    debug!(command = frame.name(), response = %hex::encode(&raw), "received");

    interpret(link, frame, &raw)
}

/// Repeat `write` until the device has buffered an answer, at most
/// `attempts` times, settling after each write.
fn write_until_answer(
    link: &mut dyn SerialLink,
    attempts: u32,
    settle: Duration,
    mut write: impl FnMut(&mut dyn SerialLink) -> Result<()>,
) -> Result<()> {
    for _ in 0..attempts {
        if link.bytes_to_read()? > 0 {
            break;
        }
        write(link)?;
        thread::sleep(settle);
    }
    Ok(())
}

/// Read until the driver reports nothing more buffered.
fn drain(link: &mut dyn SerialLink, poll: Duration) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    while link.read_available(&mut buf)? > 0 {
        thread::sleep(poll);
    }
    Ok(buf)
}

/// Complete a sentinel sequence with one more byte from the line if it
/// is not already complete.
fn read_trailer(link: &mut dyn SerialLink, lead: &[u8]) -> Result<Trailer> {
    let mut sequence = lead.to_vec();
    if sequence.len() < 2 {
        sequence.extend(link.read_byte()?);
    }
    Ok(interpret_trailer(&sequence))
}

fn interpret(link: &mut dyn SerialLink, frame: &CommandFrame, raw: &[u8]) -> Result<Response> {
    if frame.expects_record() {
        let Some(&first) = raw.first() else {
            return Err(ScaleError::Timeout);
        };
        if first == DEVICE_ERROR {
            let trailer = read_trailer(link, raw)?;
            warn!(command = frame.name(), ready = trailer.ready, "scale reported an error");
            return Ok(Response::Error);
        }

        // The ready byte trails the record and is not counted by the driver
        // until the record has been read.
        if link.read_byte()? != Some(READY) {
            debug!(command = frame.name(), "no ready byte after record");
        }

        let payload = strip_status_prefix(raw);
        if payload.len() != frame.expected_len() {
            return Err(ScaleError::ProtocolViolation(format!(
                "{} expected {} bytes, got {}",
                frame.name(),
                frame.expected_len(),
                payload.len()
            )));
        }
        return Ok(Response::Payload(Bytes::copy_from_slice(payload)));
    }

    match raw {
        [DEVICE_ERROR] => {
            let trailer = read_trailer(link, raw)?;
            warn!(command = frame.name(), ready = trailer.ready, "scale reported an error");
            Ok(Response::Error)
        }
        [READY] => Ok(Response::Ack),
        _ => Err(ScaleError::ProtocolViolation(format!(
            "{} expected a sentinel, got {:?}",
            frame.name(),
            hex::encode(raw)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use scalelink_codec::command::{
        READ_PLU, READ_TOTAL_SALES, RESET_TOTAL_SALES, TOTAL_SALES_LEN,
    };
    use scalelink_transport::scripted::{ScriptedLink, ScriptedOpener};

    use super::*;
    use crate::session::SessionState;
    use crate::testing::{device, fast_config, ready_session};

    fn record_reply(len: usize) -> Vec<u8> {
        let mut reply = vec![0x00];
        reply.extend(std::iter::repeat(0).take(len));
        reply
    }

    fn sales_frame() -> CommandFrame {
        CommandFrame::read(READ_TOTAL_SALES, Bytes::new(), TOTAL_SALES_LEN)
    }

    #[test]
    fn not_ready_writes_nothing() {
        let link = ScriptedLink::new();
        let mut session = Session::new(fast_config(), ScriptedOpener::new([link.clone()]));
        let frame = CommandFrame::read(READ_PLU, 42u32.to_le_bytes().to_vec(), 100);
        assert!(matches!(
            session.exchange(&frame),
            Err(ScaleError::NotReady)
        ));
        assert!(link.written().is_empty());
    }

    #[test]
    fn record_is_returned_without_status_prefix() {
        let mut reply = vec![0x5A];
        reply.extend(1..=TOTAL_SALES_LEN as u8);
        let link = device()
            .on_write(&[PROBE], &[READY])
            .on_write_late(&[READ_TOTAL_SALES], &reply, &[READY]);
        let mut session = ready_session(&link);

        let response = session.exchange(&sales_frame()).unwrap();
        let Response::Payload(payload) = response else {
            panic!("expected payload, got {response:?}");
        };
        assert_eq!(payload.len(), TOTAL_SALES_LEN);
        assert_eq!(payload[0], 1);
        assert_eq!(payload[TOTAL_SALES_LEN - 1], TOTAL_SALES_LEN as u8);
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(
            link.written(),
            vec![vec![PROBE], vec![PROBE], vec![READ_TOTAL_SALES]]
        );
    }

    #[test]
    fn payload_follows_command_byte() {
        let link = device()
            .on_write(&[PROBE], &[READY])
            .on_write(&[READ_PLU], &[])
            .on_write_late(&[7, 0, 0, 0], &record_reply(100), &[READY]);
        let mut session = ready_session(&link);

        let frame = CommandFrame::read(READ_PLU, 7u32.to_le_bytes().to_vec(), 100);
        assert!(matches!(
            session.exchange(&frame),
            Ok(Response::Payload(p)) if p.len() == 100
        ));
        assert_eq!(
            link.written_bytes(),
            vec![PROBE, PROBE, READ_PLU, 7, 0, 0, 0]
        );
    }

    #[test]
    fn error_sentinel_first_is_device_error() {
        let link = device()
            .on_write(&[PROBE], &[READY])
            .on_write_late(&[READ_TOTAL_SALES], &[DEVICE_ERROR], &[READY]);
        let mut session = ready_session(&link);

        assert_eq!(session.exchange(&sales_frame()).unwrap(), Response::Error);
        assert!(session.is_ready());
    }

    #[test]
    fn error_sentinel_with_trailing_bytes_is_device_error() {
        let mut reply = vec![DEVICE_ERROR];
        reply.extend([0u8; TOTAL_SALES_LEN]);
        let link = device()
            .on_write(&[PROBE], &[READY])
            .on_write(&[READ_TOTAL_SALES], &reply);
        let mut session = ready_session(&link);

        assert_eq!(session.exchange(&sales_frame()).unwrap(), Response::Error);
    }

    #[test]
    fn wrong_length_is_protocol_violation() {
        let link = device()
            .on_write(&[PROBE], &[READY])
            .on_write_late(&[READ_TOTAL_SALES], &record_reply(39), &[READY]);
        let mut session = ready_session(&link);

        assert!(matches!(
            session.exchange(&sales_frame()),
            Err(ScaleError::ProtocolViolation(_))
        ));
        assert_eq!(session.state(), SessionState::Faulted);
        assert!(!session.is_ready());
        assert!(matches!(
            session.exchange(&sales_frame()),
            Err(ScaleError::NotReady)
        ));
    }

    #[test]
    fn silent_probe_times_out_after_bounded_attempts() {
        let link = device();
        let mut session = ready_session(&link);

        assert!(matches!(
            session.exchange(&sales_frame()),
            Err(ScaleError::Timeout)
        ));
        assert_eq!(session.state(), SessionState::Faulted);
        // Handshake probe plus three wake-up probes.
        assert_eq!(link.written_bytes(), vec![PROBE; 4]);
    }

    #[test]
    fn silent_command_times_out_after_bounded_attempts() {
        let link = device().on_write(&[PROBE], &[READY]);
        let mut session = ready_session(&link);

        assert!(matches!(
            session.exchange(&sales_frame()),
            Err(ScaleError::Timeout)
        ));
        assert_eq!(
            link.written_bytes(),
            vec![PROBE, PROBE, READ_TOTAL_SALES, READ_TOTAL_SALES, READ_TOTAL_SALES]
        );
    }

    #[test]
    fn ack_command_accepts_ready() {
        let link = device()
            .on_write(&[PROBE], &[READY])
            .on_write(&[RESET_TOTAL_SALES], &[READY]);
        let mut session = ready_session(&link);

        let frame = CommandFrame::ack(RESET_TOTAL_SALES, Bytes::new());
        assert_eq!(session.exchange(&frame).unwrap(), Response::Ack);
        assert!(session.is_ready());
    }

    #[test]
    fn ack_command_reports_device_error() {
        let link = device()
            .on_write(&[PROBE], &[READY])
            .on_write_late(&[RESET_TOTAL_SALES], &[DEVICE_ERROR], &[READY]);
        let mut session = ready_session(&link);

        let frame = CommandFrame::ack(RESET_TOTAL_SALES, Bytes::new());
        assert_eq!(session.exchange(&frame).unwrap(), Response::Error);
    }

    #[test]
    fn unexpected_ack_answer_faults_session() {
        let link = device()
            .on_write(&[PROBE], &[READY])
            .on_write(&[RESET_TOTAL_SALES], &[0x00, 0x01]);
        let mut session = ready_session(&link);

        let frame = CommandFrame::ack(RESET_TOTAL_SALES, Bytes::new());
        assert!(matches!(
            session.exchange(&frame),
            Err(ScaleError::ProtocolViolation(_))
        ));
        assert_eq!(session.state(), SessionState::Faulted);
    }

    #[test]
    fn io_error_drops_link() {
        let link = device();
        let mut session = ready_session(&link);
        link.fail_writes();

        assert!(matches!(
            session.exchange(&sales_frame()),
            Err(ScaleError::Io(_))
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.link.is_none());
    }
}
