use std::io;

use boundary_io::BoundaryError;
use engine::{ContractViolation, EngineError};

/// Failure that ends the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request stream could not be read or was malformed.
    #[error(transparent)]
    Framing(#[from] BoundaryError),
    /// A command failed in a way that cannot be reported with `EXIT`.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// A response could not be written.
    #[error("failed to write response: {0}")]
    Output(#[source] io::Error),
}

impl From<ContractViolation> for SessionError {
    fn from(violation: ContractViolation) -> Self {
        Self::Engine(violation.into())
    }
}
