// src/config/mod.rs

//! Configuration loading and validation for wavebuild.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate unit definitions (`validate.rs`).
//!
//! The scheduler itself never sees this module's types; it only receives
//! the resolved `BuildUnit`s produced by [`ConfigFile::build_units`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ConfigSection, DEFAULT_MARKER_DIR, DefaultSection, RawConfigFile, UnitConfig,
};
