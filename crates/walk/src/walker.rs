use crate::builder::WalkBuilder;
use crate::entry::WalkEntry;
use crate::error::WalkError;
use std::collections::{HashSet, VecDeque};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use logging::targets::WALK;

/// Depth-first iterator over filesystem entries.
pub struct Walker {
    follow_symlinks: bool,
    root_device: Option<u64>,
    contents_first: bool,
    stack: Vec<OpenDir>,
    visited: HashSet<(u64, u64)>,
    queued: VecDeque<Result<WalkEntry, WalkError>>,
}

impl Walker {
    pub(crate) fn new(options: WalkBuilder) -> Result<Self, WalkError> {
        let WalkBuilder {
            root,
            follow_symlinks,
            same_file_system,
            contents_first,
        } = options;

        let mut walker = Self {
            follow_symlinks,
            root_device: None,
            contents_first,
            stack: Vec::new(),
            visited: HashSet::new(),
            queued: VecDeque::new(),
        };

        let metadata = walker
            .stat(&root)
            .map_err(|error| WalkError::Root {
                path: root.clone(),
                source: error,
            })?;
        if same_file_system {
            walker.root_device = Some(metadata.dev());
        }
        debug!(target: WALK, root = %root.display(), follow_symlinks, contents_first, "walk started");

        let entry = WalkEntry {
            full_path: root,
            relative_path: PathBuf::new(),
            metadata,
            is_root: true,
        };
        walker.enter(entry);
        Ok(walker)
    }

    fn stat(&self, path: &Path) -> io::Result<fs::Metadata> {
        if self.follow_symlinks {
            fs::metadata(path).or_else(|_| fs::symlink_metadata(path))
        } else {
            fs::symlink_metadata(path)
        }
    }

    fn crosses_device(&self, metadata: &fs::Metadata) -> bool {
        self.root_device
            .is_some_and(|device| device != metadata.dev())
    }

    /// Queues `entry` and, for directories not seen before, opens it.
    fn enter(&mut self, entry: WalkEntry) {
        let metadata = &entry.metadata;
        let descend = metadata.is_dir() && self.visited.insert((metadata.dev(), metadata.ino()));
        if metadata.is_dir() && !descend {
            trace!(target: WALK, path = %entry.full_path.display(), "directory already visited");
        }

        if !descend {
            self.queued.push_back(Ok(entry));
            return;
        }

        match OpenDir::open(&entry) {
            Ok(mut state) => {
                if self.contents_first {
                    state.pending = Some(entry);
                } else {
                    self.queued.push_back(Ok(entry));
                }
                self.stack.push(state);
            }
            Err(error) => {
                if self.contents_first {
                    self.queued.push_back(Err(error));
                    self.queued.push_back(Ok(entry));
                } else {
                    self.queued.push_back(Ok(entry));
                    self.queued.push_back(Err(error));
                }
            }
        }
    }
}

impl Iterator for Walker {
    type Item = Result<WalkEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.queued.pop_front() {
                return Some(item);
            }

            let top = self.stack.last_mut()?;
            let Some(name) = top.names.next() else {
                if let Some(OpenDir {
                    pending: Some(entry),
                    ..
                }) = self.stack.pop()
                {
                    return Some(Ok(entry));
                }
                continue;
            };
            let full_path = top.path.join(&name);
            let relative_path = top.relative.join(&name);

            match self.stat(&full_path) {
                Ok(metadata) => {
                    if self.crosses_device(&metadata) {
                        debug!(target: WALK, path = %full_path.display(), "skipping entry on another device");
                        continue;
                    }
                    let entry = WalkEntry {
                        full_path,
                        relative_path,
                        metadata,
                        is_root: false,
                    };
                    self.enter(entry);
                }
                Err(error) => {
                    return Some(Err(WalkError::Entry {
                        path: full_path,
                        source: error,
                    }));
                }
            }
        }
    }
}

/// A directory being walked: its sorted child names and, in post-order, the
/// entry to yield once they are exhausted.
struct OpenDir {
    path: PathBuf,
    relative: PathBuf,
    names: std::vec::IntoIter<OsString>,
    pending: Option<WalkEntry>,
}

impl OpenDir {
    fn open(entry: &WalkEntry) -> Result<Self, WalkError> {
        let listing_failed = |source| WalkError::ListDirectory {
            path: entry.full_path.clone(),
            source,
        };
        let mut names = fs::read_dir(&entry.full_path)
            .map_err(listing_failed)?
            .map(|child| child.map(|child| child.file_name()))
            .collect::<io::Result<Vec<_>>>()
            .map_err(listing_failed)?;
        names.sort();

        Ok(Self {
            path: entry.full_path.clone(),
            relative: entry.relative_path.clone(),
            names: names.into_iter(),
            pending: None,
        })
    }
}
