// src/change/detector.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Result;
use tracing::{debug, info};

use crate::change::filter::SourceFilter;
use crate::change::walk::SourceFiles;
use crate::fs::{FileSystem, RealFileSystem};

/// File extension used for per-unit marker files.
pub const MARKER_EXTENSION: &str = "stamp";

/// Hex digits of the name digest kept in a marker file name.
const MARKER_DIGEST_LEN: usize = 16;

/// Handle to the persisted "last known good build" of one unit.
///
/// Only the marker file's existence and modification time matter to the
/// timestamp strategy; the hash strategy also stores a fingerprint in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Marker {
    path: PathBuf,
}

impl Marker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Marker for `unit_name` inside `dir`.
    ///
    /// Unit names are unique ignoring case, so the name is lowercased first.
    /// The file name is a readable stem (characters outside `[a-z0-9._-]`
    /// replaced with `_`) followed by a blake3 digest of the lowercased name,
    /// so names that sanitize to the same stem still get distinct markers.
    pub fn for_unit(dir: &Path, unit_name: &str) -> Self {
        let lowered = unit_name.to_lowercase();
        let digest = blake3::hash(lowered.as_bytes()).to_hex();
        let stem: String = lowered
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self::new(dir.join(format!(
            "{stem}-{}.{MARKER_EXTENSION}",
            &digest.as_str()[..MARKER_DIGEST_LEN]
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Timestamp-based change detection.
///
/// A root has changes iff the marker is missing, or at least one
/// build-relevant file under it was modified strictly after the marker.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    fs: Arc<dyn FileSystem>,
    filter: SourceFilter,
}

impl ChangeDetector {
    pub fn new(fs: Arc<dyn FileSystem>, filter: SourceFilter) -> Self {
        Self { fs, filter }
    }

    /// Detector over the real filesystem with the standard filter.
    pub fn real() -> crate::errors::Result<Self> {
        Ok(Self::new(Arc::new(RealFileSystem), SourceFilter::standard()?))
    }

    pub fn filter(&self) -> &SourceFilter {
        &self.filter
    }

    pub fn has_changes(&self, source_root: &Path, marker: &Marker) -> bool {
        let Some(marker_time) = self.marker_time(marker) else {
            return true;
        };

        match self.first_newer_file(source_root, marker_time) {
            Some(path) => {
                debug!(root = ?source_root, file = ?path, "source file newer than marker");
                true
            }
            None => {
                debug!(root = ?source_root, "no source file newer than marker");
                false
            }
        }
    }

    /// Stamp the marker with the current time, creating it and its parent
    /// directories if needed.
    pub fn mark_up_to_date(&self, marker: &Marker) -> Result<()> {
        self.fs.write(marker.path(), &[])?;
        info!(marker = ?marker.path(), "marked up to date");
        Ok(())
    }

    /// `None` means "treat as changed": the marker is missing or its time
    /// cannot be read.
    fn marker_time(&self, marker: &Marker) -> Option<SystemTime> {
        if !self.fs.exists(marker.path()) {
            debug!(marker = ?marker.path(), "no marker; never built");
            return None;
        }
        match self.fs.modified(marker.path()) {
            Ok(time) => Some(time),
            Err(err) => {
                debug!(marker = ?marker.path(), error = %err, "unreadable marker; treating as changed");
                None
            }
        }
    }

    fn first_newer_file(&self, source_root: &Path, marker_time: SystemTime) -> Option<PathBuf> {
        SourceFiles::new(self.fs.as_ref(), &self.filter, source_root).find(|path| {
            self.fs
                .modified(path)
                .is_ok_and(|modified| modified > marker_time)
        })
    }
}
