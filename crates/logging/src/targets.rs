//! Tracing targets, one per area of the helper.
//!
//! `FS_INTERPRETER_LOG=fsi::walk=trace` narrows output to a single area.

/// Request parsing and response framing.
pub const PROTOCOL: &str = "fsi::protocol";
/// File and directory copies.
pub const COPY: &str = "fsi::copy";
/// Recursive removal.
pub const DELETE: &str = "fsi::delete";
/// Directory traversal.
pub const WALK: &str = "fsi::walk";
/// Extended attribute and ACL access.
pub const XATTR: &str = "fsi::xattr";
/// Identity changes at startup.
pub const PRIVILEGE: &str = "fsi::privilege";
/// Streamed reads and writes.
pub const STREAM: &str = "fsi::stream";

/// Every target, in the order above.
pub const ALL: [&str; 7] = [PROTOCOL, COPY, DELETE, WALK, XATTR, PRIVILEGE, STREAM];
