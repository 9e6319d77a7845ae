// src/change/walk.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::change::filter::SourceFilter;
use crate::fs::FileSystem;

/// Lazy depth-first enumeration of build-relevant files under a root.
///
/// Directories are only listed when the iterator needs more files, so a
/// consumer that stops at the first hit (e.g. `Iterator::any`) does not walk
/// the rest of the tree.
///
/// Symlinked directories are not descended into, so a link pointing back
/// into the tree cannot make the walk loop.
///
/// A directory that cannot be listed contributes no files and the walk
/// continues with its siblings. This can hide a change inside that
/// directory; it never aborts the scan.
pub struct SourceFiles<'a> {
    fs: &'a dyn FileSystem,
    filter: &'a SourceFilter,
    dirs: Vec<PathBuf>,
    files: Vec<PathBuf>,
}

impl<'a> SourceFiles<'a> {
    pub fn new(fs: &'a dyn FileSystem, filter: &'a SourceFilter, root: &Path) -> Self {
        Self {
            fs,
            filter,
            dirs: vec![root.to_path_buf()],
            files: Vec::new(),
        }
    }
}

impl Iterator for SourceFiles<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if let Some(file) = self.files.pop() {
                return Some(file);
            }

            let dir = self.dirs.pop()?;
            let entries = match self.fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(dir = ?dir, error = %err, "skipping unreadable directory");
                    continue;
                }
            };

            for entry in entries {
                if self.fs.is_dir(&entry) {
                    if self.fs.is_symlink(&entry) {
                        debug!(dir = ?entry, "not following symlinked directory");
                    } else if self.filter.is_excluded_dir(&entry) {
                        debug!(dir = ?entry, "skipping derived-output directory");
                    } else {
                        self.dirs.push(entry);
                    }
                } else if self.filter.is_source_file(&entry) {
                    self.files.push(entry);
                }
            }
        }
    }
}
