//! Request verbs and their argument lines.

use std::ffi::{OsStr, OsString};
use std::io::{Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use boundary_io::BoundaryReader;
use engine::{ContractViolation, Engine, EngineResult, ReadRange, validate_path};
use metadata::MetadataMask;

use crate::error::SessionError;

/// Command names understood by the dispatcher.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verb {
    /// `copy`
    Copy,
    /// `copy-tree`
    CopyTree,
    /// `move`
    Move,
    /// `list-directory`
    ListDirectory,
    /// `delete`
    Delete,
    /// `write-open`
    WriteOpen,
    /// `write`
    Write,
    /// `tree`
    Tree,
    /// `make-dir`
    MakeDir,
    /// `get-xattr`
    GetXattr,
    /// `set-xattr`
    SetXattr,
    /// `list-xattr`
    ListXattr,
    /// `delete-xattr`
    DeleteXattr,
    /// `stat`
    Stat,
    /// `read-open`
    ReadOpen,
    /// `read`
    Read,
    /// `symlink`
    Symlink,
    /// `chmod`
    Chmod,
    /// `setfacl`
    Setfacl,
}

impl Verb {
    /// Every verb, in protocol documentation order.
    pub const ALL: [Self; 19] = [
        Self::Copy,
        Self::CopyTree,
        Self::Move,
        Self::ListDirectory,
        Self::Delete,
        Self::WriteOpen,
        Self::Write,
        Self::Tree,
        Self::MakeDir,
        Self::GetXattr,
        Self::SetXattr,
        Self::ListXattr,
        Self::DeleteXattr,
        Self::Stat,
        Self::ReadOpen,
        Self::Read,
        Self::Symlink,
        Self::Chmod,
        Self::Setfacl,
    ];

    /// Name as it appears on the command line of a request.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::CopyTree => "copy-tree",
            Self::Move => "move",
            Self::ListDirectory => "list-directory",
            Self::Delete => "delete",
            Self::WriteOpen => "write-open",
            Self::Write => "write",
            Self::Tree => "tree",
            Self::MakeDir => "make-dir",
            Self::GetXattr => "get-xattr",
            Self::SetXattr => "set-xattr",
            Self::ListXattr => "list-xattr",
            Self::DeleteXattr => "delete-xattr",
            Self::Stat => "stat",
            Self::ReadOpen => "read-open",
            Self::Read => "read",
            Self::Symlink => "symlink",
            Self::Chmod => "chmod",
            Self::Setfacl => "setfacl",
        }
    }

    /// Looks up a verb by its command line.
    #[must_use]
    pub fn from_name(name: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.name().as_bytes() == name)
    }
}

/// A fully parsed request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    /// Copy one file or create one directory.
    Copy {
        /// Source.
        from: PathBuf,
        /// Destination.
        to: PathBuf,
        /// Replace an existing destination.
        allow_overwrite: bool,
    },
    /// Copy a whole subtree.
    CopyTree {
        /// Source root.
        from: PathBuf,
        /// Destination root.
        to: PathBuf,
        /// Replace existing destinations.
        allow_overwrite: bool,
    },
    /// Rename an entry.
    Move {
        /// Source.
        from: PathBuf,
        /// Destination.
        to: PathBuf,
        /// Replace an existing destination.
        allow_overwrite: bool,
    },
    /// Report the children of a directory.
    ListDirectory {
        /// Directory to list.
        path: PathBuf,
        /// Requested fields.
        mask: MetadataMask,
    },
    /// Remove a subtree.
    Delete {
        /// Root of the removal.
        path: PathBuf,
    },
    /// Open the write stream.
    WriteOpen {
        /// File to write.
        path: PathBuf,
        /// Truncate an existing file.
        allow_overwrite: bool,
    },
    /// Drain the request payload into the write stream.
    Write,
    /// Report a subtree.
    Tree {
        /// Root of the walk.
        path: PathBuf,
        /// Requested fields.
        mask: MetadataMask,
    },
    /// Create a directory and its parents.
    MakeDir {
        /// Directory to create.
        path: PathBuf,
    },
    /// Print one extended attribute.
    GetXattr {
        /// Entry holding the attribute.
        path: PathBuf,
        /// Attribute name.
        name: OsString,
    },
    /// Set one extended attribute.
    SetXattr {
        /// Entry holding the attribute.
        path: PathBuf,
        /// Attribute name.
        name: OsString,
        /// New value.
        value: Vec<u8>,
        /// Replace an existing value.
        allow_overwrite: bool,
    },
    /// Print every extended attribute name.
    ListXattr {
        /// Entry holding the attributes.
        path: PathBuf,
    },
    /// Remove one extended attribute.
    DeleteXattr {
        /// Entry holding the attribute.
        path: PathBuf,
        /// Attribute name.
        name: OsString,
    },
    /// Report one entry.
    Stat {
        /// Entry to report.
        path: PathBuf,
        /// Requested fields.
        mask: MetadataMask,
    },
    /// Open the read stream.
    ReadOpen {
        /// File to read.
        path: PathBuf,
    },
    /// Send a span of the read stream.
    Read {
        /// Span to send.
        range: ReadRange,
    },
    /// Create a symbolic link.
    Symlink {
        /// Link contents.
        target: PathBuf,
        /// Where to create the link.
        link_path: PathBuf,
    },
    /// Change permission bits.
    Chmod {
        /// Entry to change.
        path: PathBuf,
        /// New mode.
        mode: u32,
    },
    /// Run `setfacl` with a raw argument string.
    Setfacl {
        /// Arguments passed through to the shell.
        arguments: Vec<u8>,
    },
}

/// Reads the argument lines of one verb from the current request unit.
struct Arguments<'a, R> {
    reader: &'a mut BoundaryReader<R>,
    verb: Verb,
}

impl<R: Read> Arguments<'_, R> {
    fn line(&mut self, argument: &'static str) -> Result<Vec<u8>, SessionError> {
        self.reader.read_line()?.ok_or_else(|| {
            ContractViolation::MissingArgument {
                verb: self.verb.name(),
                argument,
            }
            .into()
        })
    }

    fn path(&mut self, argument: &'static str) -> Result<PathBuf, SessionError> {
        let line = self.line(argument)?;
        Ok(validate_path(&line)?)
    }

    fn os_string(&mut self, argument: &'static str) -> Result<OsString, SessionError> {
        let line = self.line(argument)?;
        Ok(OsStr::from_bytes(&line).to_os_string())
    }

    fn integer<T: std::str::FromStr>(&mut self, argument: &'static str) -> Result<T, SessionError> {
        let line = self.line(argument)?;
        std::str::from_utf8(&line)
            .ok()
            .and_then(|text| text.trim().parse().ok())
            .ok_or_else(|| {
                ContractViolation::MalformedArgument {
                    argument,
                    value: String::from_utf8_lossy(&line).into_owned(),
                }
                .into()
            })
    }

    fn flag(&mut self, argument: &'static str) -> Result<bool, SessionError> {
        Ok(self.integer::<i64>(argument)? != 0)
    }

    fn mask(&mut self) -> Result<MetadataMask, SessionError> {
        Ok(MetadataMask::from_bits(self.integer("mask")?))
    }

    fn range(&mut self) -> Result<ReadRange, SessionError> {
        let start = self.integer::<u64>("start")?;
        let end = self.integer::<i64>("end")?;
        let end = match end {
            -1 => None,
            end => Some(u64::try_from(end).map_err(|_| ContractViolation::MalformedArgument {
                argument: "end",
                value: end.to_string(),
            })?),
        };
        Ok(ReadRange { start, end })
    }
}

impl Request {
    /// Reads the arguments of `verb` from `reader`.
    ///
    /// # Errors
    ///
    /// A missing or malformed argument is a contract violation; framing
    /// errors from the reader are passed through.
    pub fn parse<R: Read>(verb: Verb, reader: &mut BoundaryReader<R>) -> Result<Self, SessionError> {
        let mut args = Arguments { reader, verb };
        let request = match verb {
            Verb::Copy => Self::Copy {
                from: args.path("from")?,
                to: args.path("to")?,
                allow_overwrite: args.flag("allowOverwrite")?,
            },
            Verb::CopyTree => Self::CopyTree {
                from: args.path("from")?,
                to: args.path("to")?,
                allow_overwrite: args.flag("allowOverwrite")?,
            },
            Verb::Move => Self::Move {
                from: args.path("from")?,
                to: args.path("to")?,
                allow_overwrite: args.flag("allowOverwrite")?,
            },
            Verb::ListDirectory => Self::ListDirectory {
                path: args.path("path")?,
                mask: args.mask()?,
            },
            Verb::Delete => Self::Delete {
                path: args.path("path")?,
            },
            Verb::WriteOpen => Self::WriteOpen {
                path: args.path("path")?,
                allow_overwrite: args.flag("allowOverwrite")?,
            },
            Verb::Write => Self::Write,
            Verb::Tree => Self::Tree {
                path: args.path("path")?,
                mask: args.mask()?,
            },
            Verb::MakeDir => Self::MakeDir {
                path: args.path("path")?,
            },
            Verb::GetXattr => Self::GetXattr {
                path: args.path("path")?,
                name: args.os_string("name")?,
            },
            Verb::SetXattr => Self::SetXattr {
                path: args.path("path")?,
                name: args.os_string("name")?,
                value: args.line("value")?,
                allow_overwrite: args.flag("allowOverwrite")?,
            },
            Verb::ListXattr => Self::ListXattr {
                path: args.path("path")?,
            },
            Verb::DeleteXattr => Self::DeleteXattr {
                path: args.path("path")?,
                name: args.os_string("name")?,
            },
            Verb::Stat => Self::Stat {
                path: args.path("path")?,
                mask: args.mask()?,
            },
            Verb::ReadOpen => Self::ReadOpen {
                path: args.path("path")?,
            },
            Verb::Read => Self::Read {
                range: args.range()?,
            },
            Verb::Symlink => Self::Symlink {
                target: args.path("target")?,
                link_path: args.path("linkPath")?,
            },
            Verb::Chmod => Self::Chmod {
                path: args.path("path")?,
                mode: args.integer("mode")?,
            },
            Verb::Setfacl => Self::Setfacl {
                arguments: args.line("arguments")?,
            },
        };
        Ok(request)
    }

    /// Runs the request. `payload` supplies the rest of the request unit.
    pub fn execute(
        &self,
        engine: &mut Engine,
        payload: &mut dyn Read,
        out: &mut dyn Write,
    ) -> EngineResult<()> {
        match self {
            Self::Copy {
                from,
                to,
                allow_overwrite,
            } => engine.copy(from, to, *allow_overwrite, out),
            Self::CopyTree {
                from,
                to,
                allow_overwrite,
            } => engine.copy_tree(from, to, *allow_overwrite, out),
            Self::Move {
                from,
                to,
                allow_overwrite,
            } => engine.rename(from, to, *allow_overwrite, out),
            Self::ListDirectory { path, mask } => engine.list_directory(path, *mask, out),
            Self::Delete { path } => engine.delete(path, out),
            Self::WriteOpen {
                path,
                allow_overwrite,
            } => engine.write_open(path, *allow_overwrite, out),
            Self::Write => engine.write(payload, out),
            Self::Tree { path, mask } => engine.tree(path, *mask, out),
            Self::MakeDir { path } => engine.make_dir(path, out),
            Self::GetXattr { path, name } => engine.get_xattr(path, name, out),
            Self::SetXattr {
                path,
                name,
                value,
                allow_overwrite,
            } => engine.set_xattr(path, name, value, *allow_overwrite),
            Self::ListXattr { path } => engine.list_xattr(path, out),
            Self::DeleteXattr { path, name } => engine.delete_xattr(path, name),
            Self::Stat { path, mask } => engine.stat(path, *mask, out),
            Self::ReadOpen { path } => engine.read_open(path),
            Self::Read { range } => engine.read(*range, out),
            Self::Symlink { target, link_path } => engine.symlink(target, link_path, out),
            Self::Chmod { path, mode } => engine.chmod(path, *mode, out),
            Self::Setfacl { arguments } => engine.setfacl(arguments),
        }
    }
}
