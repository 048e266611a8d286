#![deny(missing_docs)]

//! Identity-related syscalls for fs-interpreter.
//!
//! Everything that changes or inspects the process identity lives here so the
//! rest of the workspace stays free of `nix`/`libc` calls for users and groups:
//!
//! - [`drop_privileges`] performs the one-time switch to the caller-selected
//!   uid/gid (supplementary groups, then group, then user).
//! - [`NameCache`] resolves numeric owners to names for metadata output.

#[cfg(unix)]
mod identity;
#[cfg(unix)]
mod privilege;

#[cfg(unix)]
pub use identity::{NameCache, lookup_group_name, lookup_user_name};
#[cfg(unix)]
pub use privilege::{DropOutcome, PrivilegeError, TargetIdentity, drop_privileges};
