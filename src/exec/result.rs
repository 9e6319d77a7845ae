// src/exec/result.rs

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::exec::action::BuildOutcome;
use crate::plan::UnitName;

/// Outcome of running one unit's build action.
///
/// `error` is only set when `success` is false and holds the action's
/// failure message, not a backtrace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub name: UnitName,
    pub success: bool,
    /// True when the action reported that nothing needed building.
    pub skipped: bool,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn succeeded(name: impl Into<UnitName>, duration: Duration, outcome: BuildOutcome) -> Self {
        Self {
            name: name.into(),
            success: true,
            skipped: outcome == BuildOutcome::Skipped,
            duration,
            error: None,
        }
    }

    pub fn failed(name: impl Into<UnitName>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            skipped: false,
            duration,
            error: Some(error.into()),
        }
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// A run is fully successful iff every result succeeded. An empty run counts
/// as successful.
pub fn all_succeeded(results: &[ExecutionResult]) -> bool {
    results.iter().all(|r| r.success)
}

/// Counts over a result list, for summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTally {
    pub total: usize,
    pub built: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunTally {
    pub fn from_results(results: &[ExecutionResult]) -> Self {
        results.iter().fold(Self::default(), |mut tally, r| {
            tally.total += 1;
            match (r.success, r.skipped) {
                (false, _) => tally.failed += 1,
                (true, true) => tally.skipped += 1,
                (true, false) => tally.built += 1,
            }
            tally
        })
    }
}
