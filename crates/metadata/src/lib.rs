#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `metadata` turns a filesystem entry into the single comma-separated line
//! the helper reports for it. Which fields appear is chosen by a
//! [`MetadataMask`]; the order they appear in never changes.
//!
//! # Design
//!
//! - [`TreeItem`] captures the `lstat` result of one entry, with symbolic
//!   links followed to classify them.
//! - [`EntrySerializer`] walks a fixed table of `(Category, writer)` pairs
//!   once per line and runs the writers whose category the mask selects.
//!   It owns the user/group name cache and the canonical-parent cache.
//! - Extended-attribute backed categories read through [`xattr`]; shares are
//!   decoded from the POSIX access ACL by [`posix_acl`].
//!
//! # Invariants
//!
//! - A category absent from the mask contributes no field at all.
//! - Text fields never contain a bare `,` or newline.
//! - Attribute and ACL read failures degrade to empty fields (or the default
//!   sensitivity label) and never fail the line.
//!
//! # Errors
//!
//! Operations that touch the filesystem directly return [`MetadataError`],
//! which records the action, the path and the underlying [`std::io::Error`].
//!
//! # Examples
//!
//! ```no_run
//! use metadata::{Category, EntrySerializer, MetadataMask};
//! use std::path::Path;
//!
//! let mut serializer = EntrySerializer::new();
//! let mask = MetadataMask::EMPTY.with(Category::FileType).with(Category::Size);
//! let line = serializer.stat_line(Path::new("/etc/hostname"), mask)?;
//! assert!(line.starts_with(b"F,"));
//! # Ok::<(), metadata::MetadataError>(())
//! ```

mod error;
mod line;
mod link;
mod mask;
mod path_cache;
pub mod posix_acl;
mod serializer;
pub mod xattr;

pub use error::MetadataError;
pub use line::MetadataLine;
pub use link::{LinkInfo, ResolvedKind};
pub use mask::{Category, MetadataMask};
pub use path_cache::CanonicalPathCache;
pub use posix_acl::{ShareBits, ShareEntry};
pub use serializer::{EntrySerializer, EntryType, TreeItem};
