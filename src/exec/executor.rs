// src/exec/executor.rs

//! Bounded-concurrency execution of a single batch.

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::exec::action::BuildAction;
use crate::exec::result::ExecutionResult;
use crate::plan::{Batch, BuildUnit};

/// Maximum number of unit actions allowed to run at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimit(NonZeroUsize);

impl ConcurrencyLimit {
    /// The host's available parallelism (1 if it cannot be determined).
    pub fn auto() -> Self {
        Self(std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
    }

    /// Normalize a caller-supplied limit: zero or negative means
    /// [`ConcurrencyLimit::auto`].
    pub fn from_requested(requested: i64) -> Self {
        if requested <= 0 {
            return Self::auto();
        }
        let n = usize::try_from(requested).unwrap_or(usize::MAX);
        NonZeroUsize::new(n).map(Self).unwrap_or_else(Self::auto)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self::auto()
    }
}

/// Runs the units of one batch, at most `limit` at a time.
///
/// - A batch of one runs inline on the caller's task.
/// - Larger batches spawn one Tokio task per unit; each waits for a slot on
///   a counting semaphore before its action starts.
///
/// Every action runs behind an isolation boundary: an `Err` or a panic
/// becomes a failed [`ExecutionResult`] for that unit only. Durations cover
/// the action itself, not the time spent waiting for a slot.
///
/// Results are returned in batch order regardless of completion order.
pub struct BoundedExecutor {
    action: Arc<dyn BuildAction>,
    limit: ConcurrencyLimit,
}

impl BoundedExecutor {
    pub fn new(action: Arc<dyn BuildAction>, limit: ConcurrencyLimit) -> Self {
        Self { action, limit }
    }

    pub fn limit(&self) -> ConcurrencyLimit {
        self.limit
    }

    pub async fn run_batch(&self, batch: &Batch) -> Vec<ExecutionResult> {
        match batch.units() {
            [] => Vec::new(),
            [unit] => vec![run_isolated(self.action.as_ref(), unit).await],
            units => self.run_concurrent(units).await,
        }
    }

    async fn run_concurrent(&self, units: &[BuildUnit]) -> Vec<ExecutionResult> {
        let permits = self.limit.get().min(Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));

        debug!(units = units.len(), permits, "running batch concurrently");

        let mut handles = Vec::with_capacity(units.len());
        for unit in units.iter().cloned() {
            let semaphore = Arc::clone(&semaphore);
            let action = Arc::clone(&self.action);

            handles.push(tokio::spawn(async move {
                // Hold the permit until the action returns.
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(err) => {
                        return ExecutionResult::failed(
                            unit.name.clone(),
                            Duration::ZERO,
                            format!("admission gate closed: {err}"),
                        );
                    }
                };
                run_isolated(action.as_ref(), &unit).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (unit, handle) in units.iter().zip(handles) {
            match handle.await {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!(unit = %unit.name, error = %err, "unit task did not complete");
                    results.push(ExecutionResult::failed(
                        unit.name.clone(),
                        Duration::ZERO,
                        format!("unit task did not complete: {err}"),
                    ));
                }
            }
        }

        results
    }
}

/// Run one action, converting errors and panics into a failed result.
async fn run_isolated(action: &dyn BuildAction, unit: &BuildUnit) -> ExecutionResult {
    debug!(unit = %unit.name, root = ?unit.source_root, "starting build action");

    let started = Instant::now();
    let outcome = AssertUnwindSafe(async { action.build(unit).await })
        .catch_unwind()
        .await;
    let duration = started.elapsed();
    let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(Ok(build_outcome)) => {
            info!(unit = %unit.name, duration_ms, outcome = ?build_outcome, "unit succeeded");
            ExecutionResult::succeeded(unit.name.clone(), duration, build_outcome)
        }
        Ok(Err(err)) => {
            let message = format!("{err:#}");
            warn!(unit = %unit.name, duration_ms, error = %message, "unit failed");
            ExecutionResult::failed(unit.name.clone(), duration, message)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(unit = %unit.name, duration_ms, error = %message, "unit panicked");
            ExecutionResult::failed(unit.name.clone(), duration, message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "build action panicked".to_string()
    }
}
