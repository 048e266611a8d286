#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the process entry point of the fs-interpreter helper. It parses
//! the command line, configures logging, drops to the requested identity and
//! then serves requests from standard input until the input ends.
//!
//! # Design
//!
//! - [`run`] takes the argument list and the three standard streams so tests
//!   can drive a whole session in memory. The binary only forwards
//!   `std::env::args_os()` and locked standard handles.
//! - [`Session`] alternates between awaiting a command line and executing
//!   it. Each executed unit is closed by discarding unread request bytes,
//!   writing `EXIT:<status>` and writing the server boundary to both output
//!   streams.
//! - [`Request`] holds one parsed command; argument lines are validated
//!   before anything touches the filesystem.
//!
//! # Invariants
//!
//! - No command is executed before the privilege drop succeeded.
//! - Every executed command produces exactly one `EXIT` line, except when a
//!   fatal error ends the session.
//! - Standard output and standard error are flushed at the end of each unit.
//!
//! # Errors
//!
//! Usage errors exit with status `2`. Fatal session errors (framing, contract
//! violations, unwritable output, a failed privilege drop) are written to
//! standard error as `fatal: <message>` and exit with status `1`.
//!
//! # Examples
//!
//! ```
//! let input = b"stat\n/\n1\nC1".as_slice();
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["fs-interpreter", "C1", "S1", "0", "0"], input, &mut stdout, &mut stderr);
//!
//! assert_eq!(status, 0);
//! assert_eq!(stdout, b"D\nEXIT:0\nS1");
//! assert_eq!(stderr, b"S1");
//! ```

use std::ffi::OsString;
use std::io::{Read, Write};

use boundary_io::BoundaryReader;
use logging::{LogConfig, LogInitError, init_tracing};
use platform::drop_privileges;

mod arguments;
mod error;
mod request;
mod session;

pub use arguments::{Options, ParseOutcome, parse};
pub use error::SessionError;
pub use request::{Request, Verb};
pub use session::{Session, UNKNOWN_VERB_STATUS};

/// Exit status for a session that ended because its input ended.
pub const EXIT_OK: i32 = 0;
/// Exit status for a fatal error during the session.
pub const EXIT_FATAL: i32 = 1;
/// Exit status for invalid command-line usage.
pub const EXIT_USAGE: i32 = 2;

/// Runs the helper and returns the process exit status.
pub fn run<I, T, R, Out, Err>(arguments: I, stdin: R, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    R: Read,
    Out: Write,
    Err: Write,
{
    let options = match parse(arguments) {
        Ok(options) => options,
        Err(ParseOutcome::Informational(text)) => {
            let _ = stdout.write_all(text.as_bytes());
            return EXIT_OK;
        }
        Err(ParseOutcome::Usage(text)) => {
            let _ = stderr.write_all(text.as_bytes());
            return EXIT_USAGE;
        }
    };

    let config = LogConfig::from_verbose_level(options.verbosity).with_env_override();
    match init_tracing(&config) {
        Ok(()) => {}
        Err(error @ LogInitError::Filter { .. }) => {
            let _ = writeln!(stderr, "fs-interpreter: {error}");
            return EXIT_USAGE;
        }
        // A subscriber from an earlier run in this process stays in charge.
        Err(LogInitError::Install(_)) => {}
    }

    if let Err(error) = drop_privileges(options.identity) {
        let _ = writeln!(stderr, "fatal: {error}");
        return EXIT_FATAL;
    }

    let reader = match BoundaryReader::new(stdin, options.client_boundary) {
        Ok(reader) => reader,
        Err(error) => {
            let _ = writeln!(stderr, "fs-interpreter: {error}");
            return EXIT_USAGE;
        }
    };

    let mut session = Session::new(reader, options.server_boundary, &mut *stdout, &mut *stderr);
    let result = session.serve();
    session.flush();
    drop(session);

    match result {
        Ok(()) => EXIT_OK,
        Err(error) => {
            let _ = writeln!(stderr, "fatal: {error}");
            let _ = stderr.flush();
            EXIT_FATAL
        }
    }
}

/// Converts a status returned by [`run`] into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, i32::from(u8::MAX));
    std::process::ExitCode::from(u8::try_from(clamped).unwrap_or(u8::MAX))
}
