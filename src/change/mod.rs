// src/change/mod.rs

//! Change detection: "can this unit's build be skipped?"
//!
//! This module answers whether anything build-relevant changed under a
//! unit's source root since its marker was last written, and rewrites the
//! marker after a successful build. The scheduler never calls into it; a
//! build action (see [`crate::exec::CommandAction`]) consults it to no-op.
//!
//! - [`filter`] decides which files count and which directories are derived
//!   output that must be ignored.
//! - [`walk`] lazily enumerates matching files, degrading unreadable
//!   directories to "no files".
//! - [`detector`] is the timestamp strategy and the [`Marker`] handle.
//! - [`hash`] is the content-fingerprint strategy.

pub mod detector;
pub mod filter;
pub mod hash;
pub mod walk;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::fs::FileSystem;
use crate::types::ChangeStrategy;

pub use detector::{ChangeDetector, MARKER_EXTENSION, Marker};
pub use filter::{DEFAULT_EXCLUDED_DIRS, DEFAULT_INCLUDE, SourceFilter};
pub use hash::ContentHashDetector;
pub use walk::SourceFiles;

/// Change detection with the strategy picked at configuration time.
#[derive(Debug, Clone)]
pub enum ChangeGate {
    Timestamp(ChangeDetector),
    ContentHash(ContentHashDetector),
}

impl ChangeGate {
    pub fn new(strategy: ChangeStrategy, fs: Arc<dyn FileSystem>, filter: SourceFilter) -> Self {
        match strategy {
            ChangeStrategy::Timestamp => ChangeGate::Timestamp(ChangeDetector::new(fs, filter)),
            ChangeStrategy::Hash => ChangeGate::ContentHash(ContentHashDetector::new(fs, filter)),
        }
    }

    pub fn strategy(&self) -> ChangeStrategy {
        match self {
            ChangeGate::Timestamp(_) => ChangeStrategy::Timestamp,
            ChangeGate::ContentHash(_) => ChangeStrategy::Hash,
        }
    }

    pub fn has_changes(&self, source_root: &Path, marker: &Marker) -> bool {
        match self {
            ChangeGate::Timestamp(d) => d.has_changes(source_root, marker),
            ChangeGate::ContentHash(d) => d.has_changes(source_root, marker),
        }
    }

    /// Record `source_root` as built. The timestamp strategy only needs the
    /// marker; the hash strategy fingerprints the root again.
    pub fn mark_up_to_date(&self, source_root: &Path, marker: &Marker) -> Result<()> {
        match self {
            ChangeGate::Timestamp(d) => d.mark_up_to_date(marker),
            ChangeGate::ContentHash(d) => d.mark_up_to_date(source_root, marker),
        }
    }
}
