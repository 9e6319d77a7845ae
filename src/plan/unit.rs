// src/plan/unit.rs

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Canonical unit name type used throughout the scheduler.
pub type UnitName = String;

/// One independently schedulable item of work.
///
/// `source_root` bounds every file the unit's build action reads or writes.
/// Two units may only run at the same time when their roots do not overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildUnit {
    pub name: UnitName,
    pub source_root: PathBuf,
}

impl BuildUnit {
    pub fn new(name: impl Into<UnitName>, source_root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_root: source_root.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }
}

/// A set of mutually independent units that may run concurrently.
///
/// Units keep the relative order they had in the planner's input, which is
/// also the order results for this batch are reported in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    /// Zero-based position of this batch in the plan.
    pub index: usize,
    pub units: Vec<BuildUnit>,
}

impl Batch {
    pub fn new(index: usize, units: Vec<BuildUnit>) -> Self {
        Self { index, units }
    }

    pub fn units(&self) -> &[BuildUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.iter().any(|u| u.name == name)
    }
}
