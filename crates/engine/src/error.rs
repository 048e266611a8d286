//! Error types for engine operations.

use std::io;
use std::path::{Path, PathBuf};

use metadata::MetadataError;
use walk::WalkError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Caller or protocol bug. The session cannot continue after one of these.
#[derive(Debug, thiserror::Error)]
pub enum ContractViolation {
    /// A path argument reached the length limit.
    #[error("path of {len} bytes exceeds the {limit}-byte limit")]
    PathTooLong {
        /// Length of the rejected path.
        len: usize,
        /// Exclusive upper bound.
        limit: usize,
    },
    /// A path argument contained a line terminator.
    #[error("path contains a newline")]
    PathContainsNewline,
    /// A path argument contained a NUL byte.
    #[error("path contains a NUL byte")]
    PathContainsNul,
    /// An integer argument did not parse.
    #[error("malformed {argument} argument '{value}'")]
    MalformedArgument {
        /// Argument name.
        argument: &'static str,
        /// Text as received.
        value: String,
    },
    /// The request unit ended before every argument line arrived.
    #[error("request for '{verb}' ended before its {argument} argument")]
    MissingArgument {
        /// Verb being parsed.
        verb: &'static str,
        /// First argument that did not arrive.
        argument: &'static str,
    },
    /// `write-open` while a writer is still open.
    #[error("write stream already open for '{}'", .path.display())]
    WriterAlreadyOpen {
        /// File held by the open writer.
        path: PathBuf,
    },
    /// `read-open` while a reader is still open.
    #[error("read stream already open for '{}'", .path.display())]
    ReaderAlreadyOpen {
        /// File held by the open reader.
        path: PathBuf,
    },
    /// The request stream ended inside a unit, before its boundary token.
    #[error("request stream ended in the middle of a command")]
    UnexpectedEndOfInput,
}

/// Errors that can occur during engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A syscall failed.
    #[error("failed to {action} '{}': {source}", .path.display())]
    Io {
        /// Action being performed.
        action: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A precondition checked by the engine itself did not hold.
    #[error("cannot {action} '{}': {}", .path.display(), errno_text(.errno))]
    Status {
        /// Action being performed.
        action: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Positive errno describing the failure.
        errno: i32,
    },
    /// `write` or `read` arrived without a matching open stream.
    #[error("no {stream} stream is open")]
    NotOpen {
        /// Which slot was empty.
        stream: &'static str,
    },
    /// Standard output could not be written.
    #[error("failed to write response: {0}")]
    Output(#[source] io::Error),
    /// Standard input failed while draining a payload.
    #[error("failed to read request payload: {0}")]
    Input(#[source] io::Error),
    /// The caller broke the protocol contract.
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

fn errno_text(errno: &i32) -> String {
    io::Error::from_raw_os_error(*errno).to_string()
}

impl EngineError {
    /// Creates a [`EngineError::Status`] error.
    pub fn status_error(action: &'static str, path: &Path, errno: i32) -> Self {
        Self::Status {
            action,
            path: path.to_path_buf(),
            errno,
        }
    }

    /// The `EXIT` value for recoverable errors, `None` for fatal ones.
    ///
    /// Errors without an OS error number report `-EIO`.
    #[must_use]
    pub fn status(&self) -> Option<i32> {
        match self {
            Self::Io { source, .. } => Some(-source.raw_os_error().unwrap_or(libc::EIO)),
            Self::Status { errno, .. } => Some(-errno),
            Self::NotOpen { .. } => Some(-libc::EBADF),
            Self::Output(_) | Self::Input(_) | Self::Contract(_) => None,
        }
    }

    /// Returns `true` when the session must stop.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.status().is_none()
    }
}

impl From<MetadataError> for EngineError {
    fn from(error: MetadataError) -> Self {
        let action = error.context();
        let path = error.path().to_path_buf();
        Self::Io {
            action,
            path,
            source: error.into_io_error(),
        }
    }
}

impl From<WalkError> for EngineError {
    fn from(error: WalkError) -> Self {
        let path = error.path().to_path_buf();
        Self::Io {
            action: "walk",
            path,
            source: error.into_io_error(),
        }
    }
}

/// Extension trait for attaching path context to I/O results.
pub(crate) trait IoResultExt<T> {
    /// Maps an I/O error to [`EngineError::Io`] with the given action and path.
    fn with_path(self, action: &'static str, path: &Path) -> EngineResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, action: &'static str, path: &Path) -> EngineResult<T> {
        self.map_err(|source| EngineError::Io {
            action,
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Keeps the first recoverable error seen by a multi-entry operation.
#[derive(Debug, Default)]
pub(crate) struct FirstError(Option<EngineError>);

impl FirstError {
    /// Records `error`, returning it back if it is fatal.
    pub(crate) fn record(&mut self, error: EngineError) -> EngineResult<()> {
        if error.is_fatal() {
            return Err(error);
        }
        tracing::warn!(target: logging::targets::PROTOCOL, %error, "entry failed");
        if self.0.is_none() {
            self.0 = Some(error);
        }
        Ok(())
    }

    /// `Ok` when nothing failed, otherwise the first failure.
    pub(crate) fn into_result(self) -> EngineResult<()> {
        self.0.map_or(Ok(()), Err)
    }

    #[cfg(test)]
    pub(crate) const fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_negative_errno() {
        let error = EngineError::Io {
            action: "open",
            path: PathBuf::from("/x"),
            source: io::Error::from_raw_os_error(libc::ENOENT),
        };
        assert_eq!(error.status(), Some(-libc::ENOENT));
        assert!(!error.is_fatal());
        assert!(error.to_string().starts_with("failed to open '/x'"));
    }

    #[test]
    fn errors_without_errno_report_eio() {
        let error = EngineError::Io {
            action: "parse",
            path: PathBuf::from("/x"),
            source: io::Error::new(io::ErrorKind::InvalidData, "bad"),
        };
        assert_eq!(error.status(), Some(-libc::EIO));
    }

    #[test]
    fn status_errors_carry_their_errno() {
        let error = EngineError::status_error("copy", Path::new("/b"), libc::EEXIST);
        assert_eq!(error.status(), Some(-libc::EEXIST));
        assert!(error.to_string().contains("/b"));
    }

    #[test]
    fn missing_stream_is_bad_descriptor() {
        let error = EngineError::NotOpen { stream: "write" };
        assert_eq!(error.status(), Some(-libc::EBADF));
        assert_eq!(error.to_string(), "no write stream is open");
    }

    #[test]
    fn contract_and_output_errors_are_fatal() {
        let contract: EngineError = ContractViolation::PathContainsNul.into();
        assert!(contract.is_fatal());
        assert_eq!(contract.to_string(), "path contains a NUL byte");
        assert!(EngineError::Output(io::Error::from(io::ErrorKind::BrokenPipe)).is_fatal());
    }

    #[test]
    fn first_error_keeps_the_earliest() {
        let mut first = FirstError::default();
        first
            .record(EngineError::status_error("a", Path::new("/a"), libc::EACCES))
            .expect("recoverable");
        first
            .record(EngineError::status_error("b", Path::new("/b"), libc::ENOENT))
            .expect("recoverable");
        assert!(first.is_set());
        let error = first.into_result().expect_err("recorded");
        assert_eq!(error.status(), Some(-libc::EACCES));
    }

    #[test]
    fn first_error_passes_fatal_errors_through() {
        let mut first = FirstError::default();
        let fatal = EngineError::Output(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(first.record(fatal).is_err());
        assert!(first.into_result().is_ok());
    }
}
