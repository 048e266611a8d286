use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use logging::targets::COPY;
use metadata::MetadataMask;
use tracing::{debug, trace};
use walk::WalkBuilder;

use crate::COPY_CHUNK_SIZE;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, FirstError, IoResultExt};
use crate::paths::{entry_exists, is_within, resolve_lenient};

impl Engine {
    /// `copy`: copies one file, or creates one directory, at `to`.
    ///
    /// Missing parents of `to` are created and reported first. Directory
    /// contents are not copied; see [`Engine::copy_tree`].
    pub fn copy(
        &mut self,
        from: &Path,
        to: &Path,
        allow_overwrite: bool,
        out: &mut dyn Write,
    ) -> EngineResult<()> {
        let source = fs::canonicalize(from).with_path("resolve", from)?;
        let metadata = fs::metadata(&source).with_path("stat", &source)?;
        self.copy_entry(&source, &metadata, to, allow_overwrite, out)
    }

    /// `copy-tree`: copies `from` and everything below it to `to`.
    ///
    /// Links and special files are skipped. A failure on one entry does not
    /// stop the others; the subtree of a directory that could not be created
    /// is skipped and the first failure is returned.
    pub fn copy_tree(
        &mut self,
        from: &Path,
        to: &Path,
        allow_overwrite: bool,
        out: &mut dyn Write,
    ) -> EngineResult<()> {
        let source = fs::canonicalize(from).with_path("resolve", from)?;
        let walker = WalkBuilder::new(&source).build()?;
        let mut first = FirstError::default();
        let mut failed_dirs: Vec<PathBuf> = Vec::new();

        for item in walker {
            let entry = match item {
                Ok(entry) => entry,
                Err(error) => {
                    first.record(error.into())?;
                    continue;
                }
            };

            let relative = entry.relative_path();
            if failed_dirs.iter().any(|dir| relative.starts_with(dir)) {
                continue;
            }
            let file_type = entry.metadata().file_type();
            if !file_type.is_file() && !file_type.is_dir() {
                debug!(target: COPY, path = %entry.full_path().display(), "skipping non-regular entry");
                continue;
            }

            let destination = if entry.is_root() {
                to.to_path_buf()
            } else {
                to.join(relative)
            };
            let result = self.copy_entry(
                entry.full_path(),
                entry.metadata(),
                &destination,
                allow_overwrite,
                out,
            );
            if let Err(error) = result {
                if entry.is_root() {
                    return Err(error);
                }
                if file_type.is_dir() {
                    failed_dirs.push(relative.to_path_buf());
                }
                first.record(error)?;
            }
        }
        first.into_result()
    }

    fn copy_entry(
        &mut self,
        source: &Path,
        metadata: &Metadata,
        to: &Path,
        allow_overwrite: bool,
        out: &mut dyn Write,
    ) -> EngineResult<()> {
        let file_type = metadata.file_type();
        if !file_type.is_file() && !file_type.is_dir() {
            return Err(EngineError::status_error("copy", source, libc::EINVAL));
        }
        if !allow_overwrite && entry_exists(to) {
            return Err(EngineError::status_error("copy", to, libc::EEXIST));
        }
        let destination = resolve_lenient(to).with_path("resolve", to)?;
        if is_within(&destination, source) {
            return Err(EngineError::status_error("copy", to, libc::EINVAL));
        }

        if let Some(parent) = to.parent() {
            self.create_missing_dirs(parent, out)?;
        }

        if file_type.is_dir() {
            match fs::create_dir(to) {
                Ok(()) => {}
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists && to.is_dir() => {}
                Err(error) => return Err(error).with_path("create directory", to),
            }
        } else {
            let bytes = copy_file_contents(source, to, metadata.permissions().mode(), allow_overwrite)?;
            trace!(target: COPY, from = %source.display(), to = %to.display(), bytes, "file copied");
        }
        self.report(to, MetadataMask::CREATED, out)
    }
}

fn copy_file_contents(
    source: &Path,
    destination: &Path,
    mode: u32,
    allow_overwrite: bool,
) -> EngineResult<u64> {
    let mut input = File::open(source).with_path("open", source)?;

    let mut options = OpenOptions::new();
    options.write(true).mode(mode & 0o7777);
    if allow_overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut output = options.open(destination).with_path("create", destination)?;

    let mut buffer = vec![0u8; COPY_CHUNK_SIZE];
    let mut copied = 0u64;
    loop {
        let read = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error).with_path("read", source),
        };
        output
            .write_all(&buffer[..read])
            .with_path("write", destination)?;
        copied += read as u64;
    }
    Ok(copied)
}
