// src/config/model.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::change::{DEFAULT_EXCLUDED_DIRS, DEFAULT_INCLUDE, SourceFilter};
use crate::errors::Result;
use crate::exec::UnitCommand;
use crate::plan::{BuildUnit, UnitName};
use crate::types::{ChangeStrategy, PathCase};

/// Marker directory used when `[config].marker_dir` is not set.
pub const DEFAULT_MARKER_DIR: &str = ".wavebuild/markers";

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// parallelism = 4
///
/// [default]
/// skip_unchanged = true
///
/// [[unit]]
/// name = "api"
/// root = "services/api"
/// cmd = "cargo build"
/// ```
///
/// Units are an array of tables so their declaration order survives
/// deserialization; that order is the planner's input order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Defaults applied to every unit from `[default]`.
    #[serde(default)]
    pub default: DefaultSection,

    /// All units from `[[unit]]`, in declaration order.
    #[serde(default)]
    pub unit: Vec<UnitConfig>,
}

/// Validated configuration. Only constructible through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    default: DefaultSection,
    units: Vec<UnitConfig>,
    /// Directory relative unit roots and `marker_dir` are resolved against.
    base_dir: PathBuf,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of unit actions running at once within a batch.
    /// Zero or negative means "host available parallelism".
    #[serde(default)]
    pub parallelism: i64,

    /// Where per-unit change markers live.
    #[serde(default = "default_marker_dir")]
    pub marker_dir: String,

    /// Compare source roots ignoring case. Defaults to the host convention.
    #[serde(default)]
    pub case_insensitive_paths: Option<bool>,
}

fn default_marker_dir() -> String {
    DEFAULT_MARKER_DIR.to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            parallelism: 0,
            marker_dir: default_marker_dir(),
            case_insensitive_paths: None,
        }
    }
}

/// `[default]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultSection {
    /// Skip a unit's command when its sources did not change.
    #[serde(default)]
    pub skip_unchanged: bool,

    #[serde(default)]
    pub change_strategy: ChangeStrategy,

    /// File-name globs counted as build inputs; replaces the built-in list.
    #[serde(default)]
    pub include: Option<Vec<String>>,

    /// Derived-output directory names to ignore; replaces the built-in list.
    #[serde(default)]
    pub exclude_dirs: Option<Vec<String>>,
}

/// `[[unit]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    /// Unique (ignoring case) unit name.
    pub name: String,

    /// Source root, relative to the config file's directory or absolute.
    pub root: String,

    /// The command that builds this unit.
    pub cmd: String,

    /// Per-unit override of `default.skip_unchanged`.
    #[serde(default)]
    pub skip_unchanged: Option<bool>,
}

impl UnitConfig {
    pub fn effective_skip_unchanged(&self, default_skip: bool) -> bool {
        self.skip_unchanged.unwrap_or(default_skip)
    }
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        default: DefaultSection,
        units: Vec<UnitConfig>,
    ) -> Self {
        Self {
            config,
            default,
            units,
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn default_section(&self) -> &DefaultSection {
        &self.default
    }

    pub fn units(&self) -> &[UnitConfig] {
        &self.units
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_case(&self) -> PathCase {
        self.config
            .case_insensitive_paths
            .map(PathCase::from_insensitive_flag)
            .unwrap_or_else(PathCase::host)
    }

    pub fn change_strategy(&self) -> ChangeStrategy {
        self.default.change_strategy
    }

    pub fn marker_dir(&self) -> PathBuf {
        self.resolve(&self.config.marker_dir)
    }

    /// Resolved `(name, source_root)` pairs in declaration order.
    pub fn build_units(&self) -> Vec<BuildUnit> {
        self.units
            .iter()
            .map(|u| BuildUnit::new(u.name.clone(), self.resolve(&u.root)))
            .collect()
    }

    pub fn unit_commands(&self) -> HashMap<UnitName, UnitCommand> {
        self.units
            .iter()
            .map(|u| {
                let command = UnitCommand::new(u.cmd.clone())
                    .skip_unchanged(u.effective_skip_unchanged(self.default.skip_unchanged));
                (u.name.clone(), command)
            })
            .collect()
    }

    pub fn source_filter(&self) -> Result<SourceFilter> {
        let include: Vec<String> = match &self.default.include {
            Some(list) => list.clone(),
            None => DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect(),
        };
        let exclude_dirs: Vec<String> = match &self.default.exclude_dirs {
            Some(list) => list.clone(),
            None => DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        };
        SourceFilter::new(include, exclude_dirs)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let joined = self.base_dir.join(path);
        std::path::absolute(&joined).unwrap_or(joined)
    }
}
