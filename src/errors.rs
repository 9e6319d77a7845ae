// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WavebuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Duplicate build unit name: {0}")]
    DuplicateUnit(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WavebuildError>;
