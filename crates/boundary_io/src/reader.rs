use std::io::{self, Read};

use memchr::memmem;
use logging::targets::PROTOCOL;
use tracing::trace;

use crate::error::BoundaryError;

/// Capacity of the working buffer used by [`BoundaryReader::new`].
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Longest command line accepted by [`BoundaryReader::read_line`] unless
/// overridden with [`BoundaryReader::with_max_line_len`].
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Outcome of [`BoundaryReader::discard_and_reset`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Discarded {
    /// Number of unconsumed payload bytes that were thrown away.
    pub bytes: usize,
    /// `true` when the source ended instead of presenting a boundary token.
    pub end_of_input: bool,
}

/// Buffered reader that stops at every occurrence of a boundary token.
///
/// The reader keeps a single contiguous working buffer. The window
/// `buffer[cursor..cursor + cleared]` holds bytes that are known not to belong
/// to the token and may be handed out. When `boundary_found` is set the token
/// starts right after that window. Otherwise the trailing `token.len() - 1`
/// bytes of the scanned region are held back because they might be the start
/// of a token that completes after the next refill.
#[derive(Debug)]
pub struct BoundaryReader<R> {
    inner: R,
    buffer: Box<[u8]>,
    filled: usize,
    cursor: usize,
    cleared: usize,
    boundary_found: bool,
    eof: bool,
    token: Vec<u8>,
    max_line_len: usize,
}

impl<R: Read> BoundaryReader<R> {
    /// Creates a reader over `inner` delimited by `token`.
    pub fn new(inner: R, token: impl Into<Vec<u8>>) -> Result<Self, BoundaryError> {
        Self::with_capacity(inner, token, DEFAULT_BUFFER_CAPACITY)
    }

    /// Creates a reader whose working buffer holds `capacity` bytes.
    ///
    /// The token must be non-empty and no longer than the buffer, otherwise a
    /// partial match could never be completed in place.
    pub fn with_capacity(
        inner: R,
        token: impl Into<Vec<u8>>,
        capacity: usize,
    ) -> Result<Self, BoundaryError> {
        let token = token.into();
        if token.is_empty() {
            return Err(BoundaryError::EmptyToken);
        }
        if token.len() > capacity {
            return Err(BoundaryError::TokenTooLong {
                len: token.len(),
                capacity,
            });
        }

        Ok(Self {
            inner,
            buffer: vec![0; capacity].into_boxed_slice(),
            filled: 0,
            cursor: 0,
            cleared: 0,
            boundary_found: false,
            eof: false,
            token,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        })
    }

    /// Overrides the maximum line length accepted by [`read_line`](Self::read_line).
    #[must_use]
    pub const fn with_max_line_len(mut self, limit: usize) -> Self {
        self.max_line_len = limit;
        self
    }

    /// Reports whether the current unit has been fully consumed and its
    /// boundary token is next in the stream.
    pub const fn is_at_end_of_stream(&self) -> bool {
        self.boundary_found && self.cleared == 0
    }

    /// Reports whether the source is exhausted and every byte has been
    /// delivered.
    pub const fn is_eof(&self) -> bool {
        self.eof && !self.boundary_found && self.cleared == 0 && self.cursor == self.filled
    }

    /// Copies bytes that precede the next boundary into `buf`.
    ///
    /// Returns `Ok(0)` once the unit is exhausted ([`is_at_end_of_stream`]
    /// becomes `true`) or the source has ended. Bytes that are part of the
    /// token, or that might still turn out to be, are never returned.
    ///
    /// [`is_at_end_of_stream`]: Self::is_at_end_of_stream
    pub fn read_bounded(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if self.cleared > 0 {
                let count = self.cleared.min(buf.len());
                buf[..count].copy_from_slice(&self.buffer[self.cursor..self.cursor + count]);
                self.cursor += count;
                self.cleared -= count;
                return Ok(count);
            }

            if self.boundary_found || self.eof {
                return Ok(0);
            }

            self.refill()?;
        }
    }

    /// Reads one `\n`-terminated line from the current unit.
    ///
    /// The terminator is stripped. Returns `Ok(None)` when the unit (or the
    /// source) ends before any byte of a new line was read.
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>, BoundaryError> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            if self.read_bounded(&mut byte)? == 0 {
                if line.is_empty() {
                    return Ok(None);
                }
                return Err(BoundaryError::TruncatedLine { len: line.len() });
            }

            if byte[0] == b'\n' {
                return Ok(Some(line));
            }

            if line.len() >= self.max_line_len {
                return Err(BoundaryError::LineTooLong {
                    limit: self.max_line_len,
                });
            }
            line.push(byte[0]);
        }
    }

    /// Steps over the boundary token that ends the current unit.
    ///
    /// When more data is already buffered it is scanned for the next
    /// boundary immediately, so several units may be served from one refill.
    pub fn reset_stream(&mut self) -> Result<(), BoundaryError> {
        if !self.is_at_end_of_stream() {
            return Err(BoundaryError::NotAtBoundary);
        }

        self.cursor += self.token.len();
        self.boundary_found = false;
        self.cleared = 0;
        if self.cursor < self.filled {
            self.scan();
        }
        trace!(target: PROTOCOL, buffered = self.filled - self.cursor, "boundary consumed");
        Ok(())
    }

    /// Drops whatever is left of the current unit and moves to the next one.
    pub fn discard_and_reset(&mut self) -> Result<Discarded, BoundaryError> {
        let mut scratch = [0u8; 8 * 1024];
        let mut bytes = 0;
        loop {
            let read = self.read_bounded(&mut scratch)?;
            if read == 0 {
                break;
            }
            bytes += read;
        }

        if bytes > 0 {
            trace!(target: PROTOCOL, bytes, "discarded unconsumed request bytes");
        }

        if self.boundary_found {
            self.reset_stream()?;
            Ok(Discarded {
                bytes,
                end_of_input: false,
            })
        } else {
            Ok(Discarded {
                bytes,
                end_of_input: true,
            })
        }
    }

    fn refill(&mut self) -> io::Result<()> {
        let held = self.filled - self.cursor;
        if self.cursor > 0 {
            self.buffer.copy_within(self.cursor..self.filled, 0);
            self.cursor = 0;
            self.filled = held;
        }

        let read = loop {
            match self.inner.read(&mut self.buffer[self.filled..]) {
                Ok(read) => break read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error),
            }
        };

        if read == 0 {
            self.eof = true;
        } else {
            self.filled += read;
        }
        self.scan();
        Ok(())
    }

    fn scan(&mut self) {
        let window = &self.buffer[self.cursor..self.filled];
        if let Some(offset) = memmem::find(window, &self.token) {
            self.cleared = offset;
            self.boundary_found = true;
            trace!(target: PROTOCOL, offset, "boundary located");
        } else if self.eof {
            // A held prefix can no longer be completed.
            self.cleared = window.len();
        } else {
            self.cleared = window.len().saturating_sub(self.token.len() - 1);
        }
    }
}

impl<R: Read> Read for BoundaryReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_bounded(buf)
    }
}

impl<R: Read> BoundaryReader<R> {
    /// Borrows the rest of the current unit as a payload that must end at
    /// the boundary token.
    pub fn unit_payload(&mut self) -> UnitPayload<'_, R> {
        UnitPayload { reader: self }
    }
}

/// Payload view returned by [`BoundaryReader::unit_payload`].
///
/// Reads like the reader itself, except that a source ending before the
/// boundary token yields [`io::ErrorKind::UnexpectedEof`] instead of `Ok(0)`.
#[derive(Debug)]
pub struct UnitPayload<'a, R> {
    reader: &'a mut BoundaryReader<R>,
}

impl<R: Read> Read for UnitPayload<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.reader.read_bounded(buf)?;
        if read == 0 && !buf.is_empty() && !self.reader.is_at_end_of_stream() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "request stream ended before the boundary token",
            ));
        }
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_support::ChunkedReader;

    fn reader(data: &[u8], token: &str) -> BoundaryReader<Cursor<Vec<u8>>> {
        BoundaryReader::new(Cursor::new(data.to_vec()), token).expect("reader")
    }

    fn drain<R: Read>(reader: &mut BoundaryReader<R>) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 7];
        loop {
            let read = reader.read_bounded(&mut buf).expect("read");
            if read == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..read]);
        }
    }

    #[test]
    fn unit_payload_ends_cleanly_at_the_boundary() {
        let mut reader = reader(b"bodyC1next", "C1");
        let mut body = Vec::new();
        reader.unit_payload().read_to_end(&mut body).expect("payload");
        assert_eq!(body, b"body");
        assert!(reader.is_at_end_of_stream());
    }

    #[test]
    fn unit_payload_cut_short_is_unexpected_eof() {
        let mut reader = reader(b"half a bod", "C1");
        let mut body = Vec::new();
        let error = reader
            .unit_payload()
            .read_to_end(&mut body)
            .expect_err("no boundary");
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(body, b"half a bod");
    }

    #[test]
    fn rejects_empty_token() {
        let result = BoundaryReader::new(Cursor::new(Vec::new()), "");
        assert!(matches!(result, Err(BoundaryError::EmptyToken)));
    }

    #[test]
    fn rejects_token_longer_than_buffer() {
        let result = BoundaryReader::with_capacity(Cursor::new(Vec::new()), "abcdef", 4);
        assert!(matches!(
            result,
            Err(BoundaryError::TokenTooLong {
                len: 6,
                capacity: 4
            })
        ));
    }

    #[test]
    fn stops_before_boundary() {
        let mut reader = reader(b"hello C1world", "C1");
        assert_eq!(drain(&mut reader), b"hello ");
        assert!(reader.is_at_end_of_stream());
    }

    #[test]
    fn reset_moves_to_next_unit_in_same_buffer() {
        let mut reader = reader(b"firstC1secondC1", "C1");
        assert_eq!(drain(&mut reader), b"first");
        reader.reset_stream().expect("reset");
        assert_eq!(drain(&mut reader), b"second");
        reader.reset_stream().expect("reset");
        assert_eq!(drain(&mut reader), b"");
        assert!(reader.is_eof());
    }

    #[test]
    fn reset_before_boundary_is_rejected() {
        let mut reader = reader(b"payloadC1", "C1");
        let mut byte = [0u8; 1];
        reader.read_bounded(&mut byte).expect("read");
        assert!(matches!(
            reader.reset_stream(),
            Err(BoundaryError::NotAtBoundary)
        ));
    }

    #[test]
    fn token_split_across_refills_is_detected() {
        let source = ChunkedReader::new(b"abcBOUNDARYdef".to_vec(), 4);
        let mut reader = BoundaryReader::with_capacity(source, "BOUNDARY", 16).expect("reader");
        assert_eq!(drain(&mut reader), b"abc");
        assert!(reader.is_at_end_of_stream());
        reader.reset_stream().expect("reset");
        assert_eq!(drain(&mut reader), b"def");
    }

    #[test]
    fn disproven_prefix_is_delivered() {
        let source = ChunkedReader::new(b"xxBOUNDxxBOUNDARY".to_vec(), 3);
        let mut reader = BoundaryReader::with_capacity(source, "BOUNDARY", 16).expect("reader");
        assert_eq!(drain(&mut reader), b"xxBOUNDxx");
        assert!(reader.is_at_end_of_stream());
    }

    #[test]
    fn prefix_at_end_of_input_is_released() {
        let mut reader = reader(b"tailC", "C1");
        assert_eq!(drain(&mut reader), b"tailC");
        assert!(!reader.is_at_end_of_stream());
        assert!(reader.is_eof());
    }

    #[test]
    fn read_line_strips_terminator() {
        let mut reader = reader(b"copy\n/tmp/a\nC1", "C1");
        assert_eq!(reader.read_line().expect("line"), Some(b"copy".to_vec()));
        assert_eq!(reader.read_line().expect("line"), Some(b"/tmp/a".to_vec()));
        assert_eq!(reader.read_line().expect("line"), None);
        assert!(reader.is_at_end_of_stream());
    }

    #[test]
    fn read_line_reports_truncation() {
        let mut reader = reader(b"copy\n/tmp/aC1", "C1");
        reader.read_line().expect("verb");
        assert!(matches!(
            reader.read_line(),
            Err(BoundaryError::TruncatedLine { len: 6 })
        ));
    }

    #[test]
    fn read_line_enforces_limit() {
        let mut reader = reader(b"abcdefgh\nC1", "C1").with_max_line_len(4);
        assert!(matches!(
            reader.read_line(),
            Err(BoundaryError::LineTooLong { limit: 4 })
        ));
    }

    #[test]
    fn discard_skips_rest_of_unit() {
        let mut reader = reader(b"write\nbinary-dataC1stat\nC1", "C1");
        assert_eq!(reader.read_line().expect("line"), Some(b"write".to_vec()));
        let discarded = reader.discard_and_reset().expect("discard");
        assert_eq!(
            discarded,
            Discarded {
                bytes: 11,
                end_of_input: false
            }
        );
        assert_eq!(reader.read_line().expect("line"), Some(b"stat".to_vec()));
    }

    #[test]
    fn discard_reports_end_of_input() {
        let mut reader = reader(b"partial", "C1");
        let discarded = reader.discard_and_reset().expect("discard");
        assert!(discarded.end_of_input);
        assert_eq!(discarded.bytes, 7);
    }

    #[test]
    fn implements_read() {
        let mut reader = reader(b"bytesC1", "C1");
        let mut out = Vec::new();
        reader.read_to_end(&mut out).expect("read_to_end");
        assert_eq!(out, b"bytes");
    }
}
