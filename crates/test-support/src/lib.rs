//! Shared fixtures for fs-interpreter tests.
//!
//! Readers that split input at arbitrary points exercise the boundary scanner
//! across refills, and [`TestTree`] builds scratch directory trees that are
//! removed when dropped.

use std::ffi::OsStr;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Reader that hands out at most `chunk` bytes per call.
#[derive(Debug)]
pub struct ChunkedReader {
    data: Vec<u8>,
    position: usize,
    chunk: usize,
}

impl ChunkedReader {
    /// Creates a reader over `data` that returns `chunk` bytes at a time.
    pub fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self {
            data,
            position: 0,
            chunk: chunk.max(1),
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data[self.position..];
        let count = remaining.len().min(buf.len()).min(self.chunk);
        buf[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        Ok(count)
    }
}

/// Reader that returns its data and then reports [`io::ErrorKind::WouldBlock`]
/// forever, standing in for a pipe whose writer has not sent more bytes yet.
#[derive(Debug)]
pub struct StallingReader {
    data: Vec<u8>,
    position: usize,
}

impl StallingReader {
    /// Creates a reader that stalls after `data` has been consumed.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }
}

impl Read for StallingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data[self.position..];
        if remaining.is_empty() {
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        }
        let count = remaining.len().min(buf.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        Ok(count)
    }
}

/// Scratch directory with helpers for laying out files.
#[derive(Debug)]
pub struct TestTree {
    dir: TempDir,
}

impl TestTree {
    /// Creates an empty scratch directory.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Root of the scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Joins `relative` onto the root.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Writes a file, creating missing parent directories.
    pub fn file(&self, relative: impl AsRef<Path>, contents: &[u8]) -> io::Result<PathBuf> {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Creates a directory and its parents.
    pub fn dir(&self, relative: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = self.join(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Creates a symbolic link at `relative` pointing to `target`.
    #[cfg(unix)]
    pub fn symlink(&self, target: impl AsRef<Path>, relative: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = self.join(relative);
        std::os::unix::fs::symlink(target, &path)?;
        Ok(path)
    }
}

/// Checks whether `user.*` extended attributes can be written under `path`.
pub fn xattrs_supported(path: &Path) -> bool {
    let marker = OsStr::new("user.fsi_support_check");
    match xattr::set(path, marker, b"marker") {
        Ok(()) => {
            let _ = xattr::remove(path, marker);
            true
        }
        Err(_) => false,
    }
}

/// Splits helper output into lines, dropping the trailing empty element.
pub fn output_lines(output: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(output)
        .split('\n')
        .map(str::to_owned)
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_reader_limits_each_read() {
        let mut reader = ChunkedReader::new(b"abcdef".to_vec(), 4);
        let mut buf = [0u8; 16];
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn stalling_reader_blocks_after_data() {
        let mut reader = StallingReader::new(b"ab".to_vec());
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        let error = reader.read(&mut buf).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn tree_creates_nested_files() {
        let tree = TestTree::new().unwrap();
        let file = tree.file("a/b/c.txt", b"data").unwrap();
        assert_eq!(fs::read(file).unwrap(), b"data");
    }
}
