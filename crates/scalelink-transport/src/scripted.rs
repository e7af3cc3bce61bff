//! In-memory serial double that replays a scripted device.
//!
//! A script is an ordered list of steps. Each step waits for one exact
//! write; when it arrives the step's reply becomes readable. `late` bytes
//! model the trailing ready byte the scale emits after its answer: they
//! are not reported by `bytes_to_read` and only show up to a blocking
//! `read_byte` once the reply has been drained.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, TransportError};
use crate::serial::SerialConfig;
use crate::traits::{LinkOpener, SerialLink};

#[derive(Debug, Clone)]
struct Step {
    expect: Vec<u8>,
    reply: Vec<u8>,
    late: Vec<u8>,
}

#[derive(Debug, Default)]
struct ScriptState {
    steps: VecDeque<Step>,
    input: VecDeque<u8>,
    late: VecDeque<u8>,
    written: Vec<Vec<u8>>,
    fail_writes: bool,
}

/// Scripted serial link. Clones share the same device state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLink {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedLink {
    /// An idle device that never answers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `reply` when exactly `expect` is written.
    pub fn on_write(self, expect: &[u8], reply: &[u8]) -> Self {
        self.on_write_late(expect, reply, &[])
    }

    /// Answer `reply` when `expect` is written, then hold `late` back
    /// until the reply has been consumed.
    pub fn on_write_late(self, expect: &[u8], reply: &[u8], late: &[u8]) -> Self {
        self.lock().steps.push_back(Step {
            expect: expect.to_vec(),
            reply: reply.to_vec(),
            late: late.to_vec(),
        });
        self
    }

    /// Make every subsequent write fail with a broken pipe.
    pub fn fail_writes(&self) {
        self.lock().fail_writes = true;
    }

    /// Every successful write, in order.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock().written.clone()
    }

    /// All written bytes concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.lock().written.concat()
    }

    /// Steps not yet triggered.
    pub fn pending_steps(&self) -> usize {
        self.lock().steps.len()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SerialLink for ScriptedLink {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut state = self.lock();
        if let Some(byte) = state.input.pop_front() {
            return Ok(Some(byte));
        }
        Ok(state.late.pop_front())
    }

    fn read_available(&mut self, dst: &mut Vec<u8>) -> Result<usize> {
        let mut state = self.lock();
        let n = state.input.len();
        dst.extend(state.input.drain(..));
        Ok(n)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(TransportError::Io(std::io::Error::from(
                std::io::ErrorKind::BrokenPipe,
            )));
        }
        state.written.push(bytes.to_vec());

        let matched = state
            .steps
            .front()
            .is_some_and(|step| step.expect.as_slice() == bytes);
        if matched {
            if let Some(step) = state.steps.pop_front() {
                state.input.extend(step.reply);
                state.late.extend(step.late);
            }
        }
        Ok(())
    }

    fn bytes_to_read(&self) -> Result<u32> {
        Ok(self.lock().input.len() as u32)
    }

    fn clear_input(&self) -> Result<()> {
        let mut state = self.lock();
        state.input.clear();
        state.late.clear();
        Ok(())
    }

    fn clear_output(&self) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}

#[derive(Debug, Default)]
struct OpenerState {
    links: VecDeque<ScriptedLink>,
    opens: usize,
}

/// Hands out scripted links, one per `open`. Fails once they run out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOpener {
    state: Arc<Mutex<OpenerState>>,
}

impl ScriptedOpener {
    /// Opener yielding `links` in order.
    pub fn new(links: impl IntoIterator<Item = ScriptedLink>) -> Self {
        let opener = Self::default();
        opener.lock().links.extend(links);
        opener
    }

    /// Number of `open` calls so far, successful or not.
    pub fn opens(&self) -> usize {
        self.lock().opens
    }

    fn lock(&self) -> MutexGuard<'_, OpenerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LinkOpener for ScriptedOpener {
    fn open(&mut self, config: &SerialConfig) -> Result<Box<dyn SerialLink>> {
        let mut state = self.lock();
        state.opens += 1;
        match state.links.pop_front() {
            Some(link) => Ok(Box::new(link)),
            None => Err(TransportError::Open {
                port: config.port.clone(),
                source: serialport::Error::new(
                    serialport::ErrorKind::NoDevice,
                    "no scripted link left",
                ),
            }),
        }
    }
}
