// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// Relative unit roots and the marker directory are resolved against the
/// directory containing the config file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?.with_base_dir(config_base_dir(path));
    Ok(config)
}

/// - If the config path has a non-empty parent (e.g. "ci/Wavebuild.toml"),
///   use that directory.
/// - If it's a bare filename, use the current working directory.
fn config_base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
