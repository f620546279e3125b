//! Shared test fixtures.

use std::io::{self, Cursor, Read, Write};

/// Scripted terminal: reads come from `input`, writes land in `output`.
pub struct FakeTerminal {
    pub input: Cursor<Vec<u8>>,
    pub output: Vec<u8>,
}

impl FakeTerminal {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: Cursor::new(input.to_vec()),
            output: Vec::new(),
        }
    }

    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Read for FakeTerminal {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for FakeTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
