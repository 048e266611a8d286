//! Comma-separated field encoding.

use std::fmt::Display;
use std::io::Write;

const SEPARATOR: u8 = b',';

/// One metadata line under construction.
///
/// Text fields are escaped so that a field never contains a bare separator
/// or line terminator: `\` becomes `\\`, `,` becomes `\,` and a newline
/// becomes `\n`.
#[derive(Debug, Default)]
pub struct MetadataLine {
    buffer: Vec<u8>,
    fields: usize,
}

impl MetadataLine {
    /// Starts an empty line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields pushed so far.
    pub const fn field_count(&self) -> usize {
        self.fields
    }

    fn begin_field(&mut self) {
        if self.fields > 0 {
            self.buffer.push(SEPARATOR);
        }
        self.fields += 1;
    }

    /// Appends an escaped text field.
    pub fn push_text(&mut self, text: &[u8]) {
        self.begin_field();
        for &byte in text {
            match byte {
                b'\\' => self.buffer.extend_from_slice(b"\\\\"),
                b',' => self.buffer.extend_from_slice(b"\\,"),
                b'\n' => self.buffer.extend_from_slice(b"\\n"),
                other => self.buffer.push(other),
            }
        }
    }

    /// Appends a numeric or otherwise separator-free field.
    pub fn push_display(&mut self, value: impl Display) {
        self.begin_field();
        // Writing into a Vec cannot fail.
        let _ = write!(self.buffer, "{value}");
    }

    /// Appends a single-character field.
    pub fn push_char(&mut self, value: u8) {
        self.begin_field();
        self.buffer.push(value);
    }

    /// Terminates the line and returns its bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.buffer.push(b'\n');
        self.buffer
    }
}
