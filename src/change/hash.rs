// src/change/hash.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use blake3::Hasher;
use tracing::{debug, info};

use crate::change::detector::Marker;
use crate::change::filter::SourceFilter;
use crate::change::walk::SourceFiles;
use crate::fs::FileSystem;

/// Content-based change detection.
///
/// The marker stores a blake3 fingerprint over every build-relevant file
/// under the root (relative path + content hash, sorted by path). A root has
/// changes iff the marker is missing or its fingerprint differs from the
/// current one. Modification times are ignored entirely.
#[derive(Debug, Clone)]
pub struct ContentHashDetector {
    fs: Arc<dyn FileSystem>,
    filter: SourceFilter,
}

impl ContentHashDetector {
    pub fn new(fs: Arc<dyn FileSystem>, filter: SourceFilter) -> Self {
        Self { fs, filter }
    }

    /// Aggregate fingerprint of the root's current sources.
    ///
    /// Files that cannot be read are left out, matching how unreadable
    /// directories are treated by the walk.
    pub fn fingerprint(&self, source_root: &Path) -> String {
        let mut files: Vec<PathBuf> =
            SourceFiles::new(self.fs.as_ref(), &self.filter, source_root).collect();
        files.sort();

        let mut hasher = Hasher::new();
        for path in files {
            let contents = match self.fs.read(&path) {
                Ok(contents) => contents,
                Err(err) => {
                    debug!(file = ?path, error = %err, "skipping unreadable file while hashing");
                    continue;
                }
            };
            let rel = path
                .strip_prefix(source_root)
                .unwrap_or(path.as_path())
                .to_string_lossy()
                .replace('\\', "/");
            hasher.update(rel.as_bytes());
            hasher.update(&[0]);
            hasher.update(blake3::hash(&contents).as_bytes());
        }

        let hash = hasher.finalize().to_hex().to_string();
        debug!(root = ?source_root, hash = %hash, "computed source fingerprint");
        hash
    }

    pub fn has_changes(&self, source_root: &Path, marker: &Marker) -> bool {
        if !self.fs.exists(marker.path()) {
            debug!(marker = ?marker.path(), "no marker; never built");
            return true;
        }

        let stored = match self.fs.read(marker.path()) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
            Err(err) => {
                debug!(marker = ?marker.path(), error = %err, "unreadable marker; treating as changed");
                return true;
            }
        };

        stored != self.fingerprint(source_root)
    }

    /// Rewrite the marker with the root's current fingerprint.
    pub fn mark_up_to_date(&self, source_root: &Path, marker: &Marker) -> Result<()> {
        let hash = self.fingerprint(source_root);
        self.fs.write(marker.path(), hash.as_bytes())?;
        info!(marker = ?marker.path(), hash = %hash, "stored source fingerprint");
        Ok(())
    }
}
