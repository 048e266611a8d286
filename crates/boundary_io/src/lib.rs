#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `boundary_io` frames the request stream consumed by the fs-interpreter
//! helper. Requests mix text command lines with raw binary payloads, and a unit
//! ends wherever the caller-chosen boundary token occurs. Nothing is escaped or
//! length-prefixed; the caller guarantees that payloads never contain the token.
//!
//! # Design
//!
//! [`BoundaryReader`] wraps any [`std::io::Read`] source with a contiguous
//! working buffer. Each refill scans the unscanned region with
//! [`memchr::memmem`]. Bytes before a match become consumable and the unit is
//! marked finished; without a match everything except the last
//! `token.len() - 1` bytes becomes consumable, because those bytes might be
//! the start of a token that completes after the next refill.
//!
//! Line-oriented access ([`BoundaryReader::read_line`]) is layered on top of the
//! raw byte access ([`BoundaryReader::read_bounded`]), so commands and payloads
//! can be interleaved freely inside one unit.
//!
//! # Invariants
//!
//! - No byte of the token, and no unresolved token prefix, is ever returned.
//! - Every byte that is not part of a token is eventually returned, in order.
//! - Once a unit is exhausted, reads return `0` until
//!   [`BoundaryReader::reset_stream`] steps over the token.
//!
//! # Errors
//!
//! [`BoundaryError`] separates source I/O failures from framing violations such
//! as overlong or truncated command lines.
//!
//! # Examples
//!
//! ```
//! use boundary_io::BoundaryReader;
//! use std::io::Cursor;
//!
//! let input = Cursor::new(b"stat\n/tmp\n0\nC1make-dir\n/tmp/x\nC1".to_vec());
//! let mut reader = BoundaryReader::new(input, "C1").unwrap();
//!
//! assert_eq!(reader.read_line().unwrap().as_deref(), Some(&b"stat"[..]));
//! assert_eq!(reader.read_line().unwrap().as_deref(), Some(&b"/tmp"[..]));
//! assert_eq!(reader.read_line().unwrap().as_deref(), Some(&b"0"[..]));
//! assert_eq!(reader.read_line().unwrap(), None);
//! assert!(reader.is_at_end_of_stream());
//!
//! reader.reset_stream().unwrap();
//! assert_eq!(reader.read_line().unwrap().as_deref(), Some(&b"make-dir"[..]));
//! ```

mod error;
mod reader;

pub use error::BoundaryError;
pub use reader::{
    BoundaryReader, DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_LINE_LEN, Discarded, UnitPayload,
};
