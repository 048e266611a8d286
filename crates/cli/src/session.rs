//! Request/response loop.

use std::io::{Read, Write};

use boundary_io::BoundaryReader;
use engine::{ContractViolation, Engine};
use logging::targets::PROTOCOL;
use tracing::{debug, trace};

use crate::error::SessionError;
use crate::request::{Request, Verb};

/// `EXIT` status for a verb the helper does not know.
pub const UNKNOWN_VERB_STATUS: i32 = -libc::ENOSYS;

/// One helper session over a request stream and two response streams.
pub struct Session<R, Out, Err> {
    reader: BoundaryReader<R>,
    engine: Engine,
    server_boundary: Vec<u8>,
    stdout: Out,
    stderr: Err,
}

impl<R: Read, Out: Write, Err: Write> Session<R, Out, Err> {
    /// Creates a session that answers each unit of `reader`.
    pub fn new(
        reader: BoundaryReader<R>,
        server_boundary: impl Into<Vec<u8>>,
        stdout: Out,
        stderr: Err,
    ) -> Self {
        Self {
            reader,
            engine: Engine::new(),
            server_boundary: server_boundary.into(),
            stdout,
            stderr,
        }
    }

    /// Serves request units until the input ends.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error. Recoverable command failures are
    /// answered with their `EXIT` status and do not end the loop.
    pub fn serve(&mut self) -> Result<(), SessionError> {
        loop {
            let Some(line) = self.reader.read_line()? else {
                if self.reader.is_at_end_of_stream() {
                    self.reader.reset_stream()?;
                    continue;
                }
                debug!(target: PROTOCOL, "request stream closed");
                return Ok(());
            };
            if line.is_empty() {
                continue;
            }

            let status = self.execute(&line)?;
            self.finish_unit(status)?;
        }
    }

    fn execute(&mut self, line: &[u8]) -> Result<i32, SessionError> {
        self.engine.begin_command();
        let Some(verb) = Verb::from_name(line) else {
            debug!(target: PROTOCOL, verb = %String::from_utf8_lossy(line), "unknown command");
            return Ok(UNKNOWN_VERB_STATUS);
        };

        let request = Request::parse(verb, &mut self.reader)?;
        trace!(target: PROTOCOL, ?request, "executing");
        let mut payload = self.reader.unit_payload();
        match request.execute(&mut self.engine, &mut payload, &mut self.stdout) {
            Ok(()) => Ok(0),
            Err(error) => match error.status() {
                Some(status) => {
                    debug!(target: PROTOCOL, verb = verb.name(), status, %error, "command failed");
                    Ok(status)
                }
                None => Err(error.into()),
            },
        }
    }

    /// Skips what is left of the request unit and closes the response.
    ///
    /// A unit that ran into the end of the input gets no `EXIT` line.
    fn finish_unit(&mut self, status: i32) -> Result<(), SessionError> {
        let discarded = self.reader.discard_and_reset()?;
        if discarded.bytes > 0 {
            debug!(target: PROTOCOL, bytes = discarded.bytes, "unconsumed request bytes dropped");
        }
        if discarded.end_of_input {
            return Err(ContractViolation::UnexpectedEndOfInput.into());
        }

        writeln!(self.stdout, "EXIT:{status}").map_err(SessionError::Output)?;
        self.stdout
            .write_all(&self.server_boundary)
            .and_then(|()| self.stdout.flush())
            .map_err(SessionError::Output)?;
        self.stderr
            .write_all(&self.server_boundary)
            .and_then(|()| self.stderr.flush())
            .map_err(SessionError::Output)?;
        Ok(())
    }

    /// Flushes both response streams.
    pub fn flush(&mut self) {
        let _ = self.stdout.flush();
        let _ = self.stderr.flush();
    }
}
