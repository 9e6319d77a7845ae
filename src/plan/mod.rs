// src/plan/mod.rs

//! Independence analysis and batch planning.
//!
//! - [`unit`] holds the `BuildUnit` / `Batch` data types.
//! - [`root_key`] normalizes source roots and decides whether two roots
//!   overlap.
//! - [`partition`] groups units into ordered batches of mutually
//!   non-overlapping units.
//!
//! Nothing here performs IO beyond resolving relative roots against the
//! current directory; planning is a pure function of its input.

pub mod partition;
pub mod root_key;
pub mod unit;

pub use partition::{IndependenceAnalyzer, partition};
pub use root_key::{RootKey, overlaps};
pub use unit::{Batch, BuildUnit, UnitName};
