// src/exec/mod.rs

//! Execution layer.
//!
//! - [`action`] defines the `BuildAction` capability the scheduler invokes
//!   per unit, plus a closure adapter.
//! - [`result`] holds the per-unit `ExecutionResult` and helpers callers use
//!   to summarise a run.
//! - [`executor`] runs one batch with bounded concurrency and isolates each
//!   unit's failure.
//! - [`command`] is the production action: run a shell command inside the
//!   unit's source root, optionally skipping when nothing changed.

pub mod action;
pub mod command;
pub mod executor;
pub mod result;

pub use action::{ActionFuture, BuildAction, BuildOutcome, FnAction, action_fn};
pub use command::{CommandAction, UnitCommand};
pub use executor::{BoundedExecutor, ConcurrencyLimit};
pub use result::{ExecutionResult, RunTally, all_succeeded};
