use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use logging::targets::STREAM;
use metadata::MetadataMask;
use tracing::{debug, warn};

use crate::COPY_CHUNK_SIZE;
use crate::engine::{Engine, OpenStream, emit};
use crate::error::{ContractViolation, EngineError, EngineResult, IoResultExt};

/// Byte span requested by `read`.
///
/// `end` is inclusive; `None` reads to the end of the file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReadRange {
    /// First byte to send.
    pub start: u64,
    /// Last byte to send, inclusive.
    pub end: Option<u64>,
}

impl ReadRange {
    /// The whole file.
    pub const FULL: Self = Self {
        start: 0,
        end: None,
    };

    /// Clamps the range to a file of `size` bytes, returning offset and length.
    #[must_use]
    pub fn clamp(self, size: u64) -> (u64, u64) {
        let begin = self.start.min(size);
        let stop = self
            .end
            .map_or(size, |end| end.saturating_add(1).min(size));
        (begin, stop.saturating_sub(begin))
    }
}

impl Engine {
    /// `write-open`: opens `path` for the following `write` and reports it.
    ///
    /// Without `allow_overwrite` the file must not exist yet; with it an
    /// existing file is truncated.
    ///
    /// # Errors
    ///
    /// Fails with [`ContractViolation::WriterAlreadyOpen`] when a writer from
    /// an earlier `write-open` is still pending.
    pub fn write_open(
        &mut self,
        path: &Path,
        allow_overwrite: bool,
        out: &mut dyn Write,
    ) -> EngineResult<()> {
        if let Some(open) = &self.writer {
            return Err(ContractViolation::WriterAlreadyOpen {
                path: open.path.clone(),
            }
            .into());
        }

        let mut options = OpenOptions::new();
        options.write(true).mode(0o666);
        if allow_overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let file = options.open(path).with_path("open", path)?;
        debug!(target: STREAM, path = %path.display(), "writer opened");

        self.writer = Some(OpenStream {
            file,
            path: path.to_path_buf(),
        });
        self.report(path, MetadataMask::CREATED, out)
    }

    /// `write`: drains `payload` into the file opened by `write-open`, closes
    /// it and reports it.
    ///
    /// A failing `payload` is fatal, since the request stream can no longer be
    /// framed. A payload reporting [`io::ErrorKind::UnexpectedEof`] ends with
    /// [`ContractViolation::UnexpectedEndOfInput`] and the file is not
    /// reported.
    pub fn write(&mut self, payload: &mut dyn Read, out: &mut dyn Write) -> EngineResult<()> {
        let OpenStream { mut file, path } = self
            .writer
            .take()
            .ok_or(EngineError::NotOpen { stream: "write" })?;

        let mut buffer = vec![0u8; COPY_CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let read = match payload.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(target: STREAM, path = %path.display(), bytes = written, "payload cut short");
                    return Err(ContractViolation::UnexpectedEndOfInput.into());
                }
                Err(error) => return Err(EngineError::Input(error)),
            };
            file.write_all(&buffer[..read]).with_path("write", &path)?;
            written += read as u64;
        }
        drop(file);
        debug!(target: STREAM, path = %path.display(), bytes = written, "writer closed");

        self.report(&path, MetadataMask::CREATED, out)
    }

    /// `read-open`: opens `path` for the following `read`.
    ///
    /// # Errors
    ///
    /// Fails with [`ContractViolation::ReaderAlreadyOpen`] when a reader from
    /// an earlier `read-open` is still pending. Directories are refused with
    /// `EISDIR` and other non-regular files with `EINVAL`.
    pub fn read_open(&mut self, path: &Path) -> EngineResult<()> {
        if let Some(open) = &self.reader {
            return Err(ContractViolation::ReaderAlreadyOpen {
                path: open.path.clone(),
            }
            .into());
        }
        let file = File::open(path).with_path("open", path)?;
        let file_type = file.metadata().with_path("stat", path)?.file_type();
        if !file_type.is_file() {
            let errno = if file_type.is_dir() { libc::EISDIR } else { libc::EINVAL };
            return Err(EngineError::status_error("open", path, errno));
        }
        debug!(target: STREAM, path = %path.display(), "reader opened");
        self.reader = Some(OpenStream {
            file,
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// `read`: sends `range` of the file opened by `read-open` and closes it.
    ///
    /// The payload is preceded by a `<count>\n` header. Exactly `count` bytes
    /// follow even when the file shrinks meanwhile; the missing tail is sent
    /// as zeros and the command fails with `EIO`.
    pub fn read(&mut self, range: ReadRange, out: &mut dyn Write) -> EngineResult<()> {
        let OpenStream { mut file, path } = self
            .reader
            .take()
            .ok_or(EngineError::NotOpen { stream: "read" })?;

        let size = file.metadata().with_path("stat", &path)?.len();
        let (offset, count) = range.clamp(size);
        file.seek(SeekFrom::Start(offset)).with_path("seek", &path)?;
        emit(out, format!("{count}\n").as_bytes())?;

        let mut buffer = vec![0u8; COPY_CHUNK_SIZE];
        let mut remaining = count;
        let mut failure = None;
        while remaining > 0 {
            let want = chunk_len(remaining, buffer.len());
            match file.read(&mut buffer[..want]) {
                Ok(0) => {
                    failure = Some(EngineError::status_error("read", &path, libc::EIO));
                    break;
                }
                Ok(read) => {
                    emit(out, &buffer[..read])?;
                    remaining -= read as u64;
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    failure = Some(EngineError::Io {
                        action: "read",
                        path: path.clone(),
                        source: error,
                    });
                    break;
                }
            }
        }

        if let Some(error) = failure {
            warn!(target: STREAM, path = %path.display(), missing = remaining, "padding short read");
            buffer.fill(0);
            while remaining > 0 {
                let pad = chunk_len(remaining, buffer.len());
                emit(out, &buffer[..pad])?;
                remaining -= pad as u64;
            }
            return Err(error);
        }
        debug!(target: STREAM, path = %path.display(), bytes = count, "reader closed");
        Ok(())
    }
}

fn chunk_len(remaining: u64, capacity: usize) -> usize {
    usize::try_from(remaining).map_or(capacity, |remaining| remaining.min(capacity))
}
