#![allow(dead_code)]

use wavebuild::config::{ConfigFile, ConfigSection, DefaultSection, RawConfigFile, UnitConfig};
use wavebuild::plan::BuildUnit;
use wavebuild::types::ChangeStrategy;

/// Shorthand for a unit list from `(name, root)` pairs, in order.
pub fn units(pairs: &[(&str, &str)]) -> Vec<BuildUnit> {
    pairs
        .iter()
        .map(|(name, root)| BuildUnit::new(*name, *root))
        .collect()
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                default: DefaultSection::default(),
                unit: Vec::new(),
            },
        }
    }

    pub fn with_unit(mut self, unit: UnitConfig) -> Self {
        self.config.unit.push(unit);
        self
    }

    pub fn with_parallelism(mut self, n: i64) -> Self {
        self.config.config.parallelism = n;
        self
    }

    pub fn with_marker_dir(mut self, dir: &str) -> Self {
        self.config.config.marker_dir = dir.to_string();
        self
    }

    pub fn with_case_insensitive_paths(mut self, val: bool) -> Self {
        self.config.config.case_insensitive_paths = Some(val);
        self
    }

    pub fn with_default_skip_unchanged(mut self, val: bool) -> Self {
        self.config.default.skip_unchanged = val;
        self
    }

    pub fn with_change_strategy(mut self, strategy: ChangeStrategy) -> Self {
        self.config.default.change_strategy = strategy;
        self
    }

    pub fn with_include(mut self, pattern: &str) -> Self {
        self.config
            .default
            .include
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `UnitConfig`.
pub struct UnitConfigBuilder {
    unit: UnitConfig,
}

impl UnitConfigBuilder {
    pub fn new(name: &str, root: &str) -> Self {
        Self {
            unit: UnitConfig {
                name: name.to_string(),
                root: root.to_string(),
                cmd: format!("echo {name}"),
                skip_unchanged: None,
            },
        }
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.unit.cmd = cmd.to_string();
        self
    }

    pub fn skip_unchanged(mut self, val: bool) -> Self {
        self.unit.skip_unchanged = Some(val);
        self
    }

    pub fn build(self) -> UnitConfig {
        self.unit
    }
}
