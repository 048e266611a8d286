use std::io;

/// Errors produced while reading a boundary-framed stream.
///
/// Only [`BoundaryError::Io`] originates from the underlying source. Every other
/// variant means the peer broke the framing contract and the stream can no
/// longer be trusted.
#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    /// Reading from the underlying source failed.
    #[error("failed to read request stream: {0}")]
    Io(#[from] io::Error),

    /// The boundary token supplied at construction was empty.
    #[error("boundary token must not be empty")]
    EmptyToken,

    /// The boundary token does not fit in the working buffer.
    #[error("boundary token of {len} bytes exceeds the {capacity} byte buffer")]
    TokenTooLong {
        /// Length of the rejected token.
        len: usize,
        /// Capacity of the working buffer.
        capacity: usize,
    },

    /// No line terminator appeared within the permitted line length.
    #[error("command line exceeds {limit} bytes without a terminator")]
    LineTooLong {
        /// Maximum accepted line length in bytes.
        limit: usize,
    },

    /// The unit ended in the middle of a line.
    #[error("request unit ended inside a line ({len} bytes without terminator)")]
    TruncatedLine {
        /// Bytes collected before the unit ended.
        len: usize,
    },

    /// [`BoundaryReader::reset_stream`](crate::BoundaryReader::reset_stream) was
    /// called before the current unit had been fully consumed.
    #[error("cannot reset stream: current unit has not reached its boundary")]
    NotAtBoundary,
}
