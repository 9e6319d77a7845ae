// src/engine/mod.rs

//! Orchestration engine for wavebuild.
//!
//! [`runner::ScheduleRunner`] partitions the units once, then feeds the
//! batches one at a time to the [`crate::exec::BoundedExecutor`], collecting
//! every unit's result. Batch N+1 never starts before batch N has finished;
//! that ordering is the only thing keeping overlapping units apart.
//!
//! [`cancel::CancellationFlag`] is the cooperative stop signal, checked
//! before each batch.

pub mod cancel;
pub mod runner;

pub use cancel::CancellationFlag;
pub use runner::ScheduleRunner;
