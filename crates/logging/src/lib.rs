#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Diagnostic logging for fs-interpreter. Every crate in the workspace logs
//! through the `tracing` macros using one of the targets in [`targets`]; the
//! binary calls [`init_tracing`] once at startup to route those events to
//! standard error.
//!
//! # Design
//!
//! [`LogConfig`] turns the `-v` count into a level filter and lets the
//! `FS_INTERPRETER_LOG` environment variable replace it with a full
//! `EnvFilter` directive. The subscriber never writes ANSI escapes because
//! standard error doubles as a protocol channel that carries boundary tokens.
//!
//! # Examples
//!
//! ```
//! use logging::LogConfig;
//!
//! let config = LogConfig::from_verbose_level(2);
//! assert_eq!(config.directive(), "debug");
//! ```

mod config;
pub mod targets;
mod tracing_init;

pub use config::{LOG_ENV_VAR, LogConfig};
pub use tracing_init::{LogInitError, init_tracing};
