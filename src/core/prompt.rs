//! Username prompt input
//!
//! Reads the login name one byte at a time until a newline. Ctrl-U erases
//! everything typed so far, echoing a backspace-space-backspace per byte.

use std::io::{self, Read, Write};

use tracing::debug;

use super::session::SessionError;

/// Line-kill control code (Ctrl-U).
pub const LINE_KILL: u8 = b'U' ^ 0x40;

/// Visual erase of one character.
const ERASE: &[u8] = b"\x08 \x08";

/// Default buffer capacity, including the terminator slot.
pub const DEFAULT_CAPACITY: usize = 30;

/// Capacity-capped buffer for the name being typed.
///
/// One slot of the capacity is reserved for the terminator, so at most
/// `capacity - 1` bytes are kept. Bytes beyond that are dropped.
#[derive(Debug, Clone)]
pub struct InputBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl InputBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            bytes: Vec::with_capacity(capacity - 1),
            capacity,
        }
    }

    /// Number of bytes the buffer will hold.
    pub fn usable(&self) -> usize {
        self.capacity - 1
    }

    /// Append a byte; returns `false` if it was dropped for lack of room.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.bytes.len() < self.usable() {
            self.bytes.push(byte);
            true
        } else {
            false
        }
    }

    pub fn pop(&mut self) -> Option<u8> {
        self.bytes.pop()
    }

    /// The typed bytes, unmodified. Names are not required to be UTF-8.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Result of one read cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A newline was typed; the bytes may be empty.
    Line(Vec<u8>),
    /// The terminal reported end of file. A newline has already been echoed.
    EndOfInput,
}

/// Input state while a line is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptState {
    AwaitingLine,
    LineComplete,
}

/// Line reader with line-kill editing.
#[derive(Debug, Clone)]
pub struct PromptReader {
    capacity: usize,
}

impl Default for PromptReader {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PromptReader {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Read one line from `term`. `tty` names the device in errors.
    pub fn read_line<T: Read + Write>(
        &self,
        term: &mut T,
        tty: &str,
    ) -> Result<ReadOutcome, SessionError> {
        let mut buffer = InputBuffer::with_capacity(self.capacity);
        let mut state = PromptState::AwaitingLine;

        while state == PromptState::AwaitingLine {
            let Some(byte) = read_byte(term, tty)? else {
                let _ = term.write_all(b"\n");
                let _ = term.flush();
                return Ok(ReadOutcome::EndOfInput);
            };

            match byte {
                b'\n' => state = PromptState::LineComplete,
                LINE_KILL => {
                    while buffer.pop().is_some() {
                        let _ = term.write_all(ERASE);
                    }
                    let _ = term.flush();
                }
                _ => {
                    if !buffer.push(byte) {
                        debug!("Input buffer full, dropping byte");
                    }
                }
            }
        }

        Ok(ReadOutcome::Line(buffer.into_bytes()))
    }
}

/// Blocking single-byte read; `None` on end of file.
fn read_byte<T: Read>(term: &mut T, tty: &str) -> Result<Option<u8>, SessionError> {
    let mut byte = [0u8; 1];
    loop {
        match term.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(SessionError::Read {
                    tty: tty.to_string(),
                    source: e,
                })
            }
        }
    }
}
