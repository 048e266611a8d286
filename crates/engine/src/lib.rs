#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` executes the filesystem commands served by the fs-interpreter
//! helper. Every command is a method on [`Engine`] that writes its result
//! lines to a caller-supplied sink and returns an [`EngineResult`]; the
//! dispatcher turns that result into the `EXIT` status of the response.
//!
//! # Design
//!
//! - [`Engine`] owns the session-scoped state: the
//!   [`metadata::EntrySerializer`] with its name and path caches, and the
//!   single write and read stream slots used by `write-open`/`write` and
//!   `read-open`/`read`.
//! - Recursive commands drive [`walk::Walker`]: `delete` and `copy-tree` walk
//!   physically, `tree` and `move` walk logically without leaving the root's
//!   device.
//! - Multi-entry commands keep going after a per-entry failure and report the
//!   first one. `delete` succeeds when anything was removed.
//!
//! # Invariants
//!
//! - At most one write stream and one read stream are open at a time.
//! - Every file and directory handle is owned by a value and closed on every
//!   exit path.
//! - Metadata for an entry is emitted only after the operation on it
//!   succeeded (for `delete`, after it was removed).
//!
//! # Errors
//!
//! [`EngineError`] separates recoverable failures, reported as
//! `-errno` by [`EngineError::status`], from fatal ones: a
//! [`ContractViolation`], an unwritable response sink or a failing request
//! stream.
//!
//! # Examples
//!
//! ```
//! use engine::Engine;
//! use metadata::MetadataMask;
//!
//! let scratch = tempfile::tempdir().expect("tempdir");
//! let target = scratch.path().join("a/b");
//!
//! let mut engine = Engine::new();
//! let mut out = Vec::new();
//! engine.make_dir(&target, &mut out).expect("make-dir");
//! assert!(target.is_dir());
//! assert_eq!(out.iter().filter(|&&byte| byte == b'\n').count(), 2);
//!
//! out.clear();
//! engine.stat(&target, MetadataMask::EMPTY, &mut out).expect("stat");
//! assert!(out.starts_with(b"D,"));
//! ```

mod attrs;
mod copy;
mod delete;
mod engine;
mod error;
mod link;
mod listing;
mod mkdir;
mod paths;
mod rename;
mod stream;

pub use engine::Engine;
pub use error::{ContractViolation, EngineError, EngineResult};
pub use paths::{PATH_MAX, is_within, resolve_lenient, validate_path};
pub use stream::ReadRange;

/// Size of the buffer used to copy file contents and stream payloads.
pub const COPY_CHUNK_SIZE: usize = 32 * 1024;
