#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` provides the deterministic filesystem traversal behind the helper's
//! recursive commands. `tree` and `move` walk logically and stay on one
//! device, `delete` walks physically with children before parents, and
//! `copy-tree` walks physically in pre-order.
//!
//! # Design
//!
//! - [`WalkBuilder`] configures traversal: link following, device
//!   confinement, and pre-order or post-order.
//! - [`Walker`] implements [`Iterator`] and yields [`WalkEntry`] values
//!   depth-first. Directory contents are sorted by name before any of them
//!   is visited, so the sequence does not depend on the filesystem's own
//!   iteration order.
//! - [`WalkError`] describes I/O failures encountered while querying metadata
//!   or reading directories. Errors are yielded in place and traversal carries
//!   on with the next entry, so callers decide whether to stop.
//!
//! # Invariants
//!
//! - No entry is yielded twice. Directories are tracked by device and inode,
//!   so a followed link back to an ancestor is reported but not descended.
//! - With device confinement enabled, every yielded entry lives on the root's
//!   device.
//! - In post-order every child is yielded before its parent directory.
//! - Traversal never panics.
//!
//! # Errors
//!
//! [`WalkBuilder::build`] fails when the root cannot be inspected. Later
//! failures surface as `Err` items; [`WalkError::into_io_error`] recovers the
//! originating [`std::io::Error`].
//!
//! # Examples
//!
//! A post-order walk yields every file before the directory holding it,
//! which is the order a recursive delete needs.
//!
//! ```
//! use std::path::PathBuf;
//! use test_support::TestTree;
//! use walk::WalkBuilder;
//!
//! let tree = TestTree::new().expect("tree");
//! tree.file("top/one", b"1").expect("file");
//! tree.file("top/sub/two", b"2").expect("file");
//!
//! let order: Vec<PathBuf> = WalkBuilder::new(tree.join("top"))
//!     .contents_first(true)
//!     .build()
//!     .expect("walker")
//!     .map(|entry| entry.expect("entry").relative_path().to_path_buf())
//!     .collect();
//!
//! assert_eq!(order, ["one", "sub/two", "sub", ""].map(PathBuf::from));
//! ```

mod builder;
mod entry;
mod error;
mod walker;

pub use builder::WalkBuilder;
pub use entry::WalkEntry;
pub use error::WalkError;
pub use walker::Walker;

#[cfg(test)]
mod tests;
