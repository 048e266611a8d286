//! One-time privilege drop performed before the helper serves any request.

use nix::unistd::{Gid, Uid, setgid, setuid};
use tracing::info;

/// User and group the helper should run as.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TargetIdentity {
    /// Numeric user id.
    pub uid: u32,
    /// Numeric group id.
    pub gid: u32,
}

impl TargetIdentity {
    /// Creates a target identity.
    #[must_use]
    pub const fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// A drop is only requested when both ids are non-zero.
    #[must_use]
    pub const fn requests_drop(self) -> bool {
        self.uid != 0 && self.gid != 0
    }
}

/// What [`drop_privileges`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DropOutcome {
    /// The identity was left untouched because no drop was requested.
    Skipped,
    /// The process now runs as the target user and group.
    Dropped,
}

/// Failure to assume the target identity. Always fatal for the helper.
#[derive(Debug, thiserror::Error)]
pub enum PrivilegeError {
    /// Supplementary groups could not be reset.
    #[error("failed to reset supplementary groups to {gid}: {source}")]
    SetGroups {
        /// Group the list was being reset to.
        gid: u32,
        /// Errno reported by the kernel.
        #[source]
        source: nix::Error,
    },
    /// `setgid` failed.
    #[error("failed to switch group to {gid}: {source}")]
    SetGid {
        /// Requested group id.
        gid: u32,
        /// Errno reported by the kernel.
        #[source]
        source: nix::Error,
    },
    /// `setuid` failed.
    #[error("failed to switch user to {uid}: {source}")]
    SetUid {
        /// Requested user id.
        uid: u32,
        /// Errno reported by the kernel.
        #[source]
        source: nix::Error,
    },
}

/// Switches the process to `target`, group before user.
///
/// The group must change first: once the user id is dropped the process no
/// longer has the privilege to change its group.
pub fn drop_privileges(target: TargetIdentity) -> Result<DropOutcome, PrivilegeError> {
    if !target.requests_drop() {
        return Ok(DropOutcome::Skipped);
    }

    let gid = Gid::from_raw(target.gid);
    let uid = Uid::from_raw(target.uid);

    reset_supplementary_groups(gid)?;
    setgid(gid).map_err(|source| PrivilegeError::SetGid {
        gid: target.gid,
        source,
    })?;
    setuid(uid).map_err(|source| PrivilegeError::SetUid {
        uid: target.uid,
        source,
    })?;

    info!(
        target: "fsi::privilege",
        uid = target.uid,
        gid = target.gid,
        "dropped privileges"
    );
    Ok(DropOutcome::Dropped)
}

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
fn reset_supplementary_groups(gid: Gid) -> Result<(), PrivilegeError> {
    if !nix::unistd::geteuid().is_root() {
        return Ok(());
    }
    nix::unistd::setgroups(&[gid]).map_err(|source| PrivilegeError::SetGroups {
        gid: gid.as_raw(),
        source,
    })
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn reset_supplementary_groups(_gid: Gid) -> Result<(), PrivilegeError> {
    Ok(())
}
