use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use metadata::{EntrySerializer, MetadataLine, MetadataMask};

use crate::error::{EngineError, EngineResult};

/// Session-scoped command executor.
///
/// One value lives for the whole helper process. Commands run one at a time
/// and write their result lines to the sink they are given.
#[derive(Debug, Default)]
pub struct Engine {
    pub(crate) serializer: EntrySerializer,
    pub(crate) writer: Option<OpenStream>,
    pub(crate) reader: Option<OpenStream>,
}

/// File held open between a `*-open` command and its transfer.
#[derive(Debug)]
pub(crate) struct OpenStream {
    pub(crate) file: File,
    pub(crate) path: PathBuf,
}

impl Engine {
    /// Creates an engine with no open streams.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets per-command caches. Call before executing each command.
    pub fn begin_command(&mut self) {
        self.serializer.begin_command();
    }

    /// Returns `true` while a `write-open` awaits its `write`.
    #[must_use]
    pub const fn has_open_writer(&self) -> bool {
        self.writer.is_some()
    }

    /// Returns `true` while a `read-open` awaits its `read`.
    #[must_use]
    pub const fn has_open_reader(&self) -> bool {
        self.reader.is_some()
    }

    /// `lstat`s `path` and writes its metadata line.
    pub(crate) fn report(
        &mut self,
        path: &Path,
        mask: MetadataMask,
        out: &mut dyn Write,
    ) -> EngineResult<()> {
        let line = self.serializer.stat_line(path, mask)?;
        emit(out, &line)
    }

    /// Writes `path` as a single escaped field on its own line.
    pub(crate) fn report_path(path: &Path, out: &mut dyn Write) -> EngineResult<()> {
        use std::os::unix::ffi::OsStrExt;

        let mut line = MetadataLine::new();
        line.push_text(path.as_os_str().as_bytes());
        emit(out, &line.finish())
    }
}

/// Writes response bytes, treating failure as fatal.
pub(crate) fn emit(out: &mut dyn Write, bytes: &[u8]) -> EngineResult<()> {
    out.write_all(bytes).map_err(EngineError::Output)
}
