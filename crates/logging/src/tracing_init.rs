//! Subscriber installation.

use std::io;

use tracing_subscriber::EnvFilter;

use super::config::LogConfig;

/// Failure to install the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LogInitError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter '{directive}': {source}")]
    Filter {
        /// Directive as given.
        directive: String,
        /// Parser diagnostic.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    /// A global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Builds the filter described by `config`.
pub(crate) fn build_filter(config: &LogConfig) -> Result<EnvFilter, LogInitError> {
    let directive = config.directive();
    EnvFilter::try_new(&directive).map_err(|source| LogInitError::Filter { directive, source })
}

/// Installs a plain-text subscriber writing to standard error.
///
/// ```rust,ignore
/// use logging::{LogConfig, init_tracing};
///
/// init_tracing(&LogConfig::from_verbose_level(1).with_env_override())?;
/// tracing::info!(target: logging::targets::COPY, "copied");
/// ```
pub fn init_tracing(config: &LogConfig) -> Result<(), LogInitError> {
    let filter = build_filter(config)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| LogInitError::Install(error.to_string()))
}
