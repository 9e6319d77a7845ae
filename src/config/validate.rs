// src/config/validate.rs

use std::collections::HashMap;

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WavebuildError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = WavebuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.default, raw.unit))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_units(cfg)?;
    validate_global_config(cfg)?;
    validate_units(cfg)?;
    validate_unique_names(cfg)?;
    validate_patterns(cfg)?;
    Ok(())
}

fn ensure_has_units(cfg: &RawConfigFile) -> Result<()> {
    if cfg.unit.is_empty() {
        return Err(WavebuildError::ConfigError(
            "config must contain at least one [[unit]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.marker_dir.trim().is_empty() {
        return Err(WavebuildError::ConfigError(
            "[config].marker_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_units(cfg: &RawConfigFile) -> Result<()> {
    for (i, unit) in cfg.unit.iter().enumerate() {
        if unit.name.trim().is_empty() {
            return Err(WavebuildError::ConfigError(format!(
                "unit #{} has an empty `name`",
                i + 1
            )));
        }
        if unit.root.trim().is_empty() {
            return Err(WavebuildError::ConfigError(format!(
                "unit '{}' has an empty `root`",
                unit.name
            )));
        }
        if unit.cmd.trim().is_empty() {
            return Err(WavebuildError::ConfigError(format!(
                "unit '{}' has an empty `cmd`",
                unit.name
            )));
        }
    }
    Ok(())
}

/// Unit names are unique ignoring case.
fn validate_unique_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for unit in &cfg.unit {
        if let Some(first) = seen.insert(unit.name.to_lowercase(), &unit.name) {
            return Err(WavebuildError::DuplicateUnit(format!(
                "'{}' conflicts with '{}'",
                unit.name, first
            )));
        }
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    if let Some(include) = &cfg.default.include {
        for pattern in include {
            Glob::new(pattern)?;
        }
    }
    Ok(())
}
