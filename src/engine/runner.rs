// src/engine/runner.rs

use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::cancel::CancellationFlag;
use crate::exec::{BoundedExecutor, BuildAction, ConcurrencyLimit, ExecutionResult};
use crate::plan::{Batch, BuildUnit, IndependenceAnalyzer};
use crate::types::PathCase;

/// Runs a whole unit set: partition once, then execute batch by batch.
///
/// - Failures are data: a failed unit never stops its batch or later
///   batches.
/// - Cancellation is checked before each batch only. A batch that started
///   always runs to completion, and batches that never started produce no
///   results.
/// - Results come back in batch order, then input order within a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleRunner {
    analyzer: IndependenceAnalyzer,
    limit: ConcurrencyLimit,
}

impl ScheduleRunner {
    pub fn new(limit: ConcurrencyLimit) -> Self {
        Self {
            analyzer: IndependenceAnalyzer::default(),
            limit,
        }
    }

    pub fn with_path_case(mut self, case: PathCase) -> Self {
        self.analyzer = IndependenceAnalyzer::new(case);
        self
    }

    pub fn limit(&self) -> ConcurrencyLimit {
        self.limit
    }

    /// The batches [`ScheduleRunner::run`] would execute, without running
    /// anything.
    pub fn plan(&self, units: &[BuildUnit]) -> Vec<Batch> {
        self.analyzer.partition(units)
    }

    pub async fn run(
        &self,
        units: &[BuildUnit],
        action: Arc<dyn BuildAction>,
        cancel: &CancellationFlag,
    ) -> Vec<ExecutionResult> {
        self.run_observed(units, action, cancel, |_, _| {}).await
    }

    /// Like [`ScheduleRunner::run`], calling `on_batch` after every completed
    /// batch with that batch's results.
    ///
    /// This is the hook for caller-side policies such as fail-fast: the
    /// observer can inspect the results and cancel `cancel` so that no
    /// further batch starts.
    pub async fn run_observed<F>(
        &self,
        units: &[BuildUnit],
        action: Arc<dyn BuildAction>,
        cancel: &CancellationFlag,
        mut on_batch: F,
    ) -> Vec<ExecutionResult>
    where
        F: FnMut(&Batch, &[ExecutionResult]),
    {
        let batches = self.plan(units);
        let executor = BoundedExecutor::new(action, self.limit);
        let mut results = Vec::with_capacity(units.len());

        info!(
            units = units.len(),
            batches = batches.len(),
            limit = self.limit.get(),
            "starting build run"
        );

        for batch in &batches {
            if cancel.is_cancelled() {
                info!(
                    next_batch = batch.index,
                    remaining = batches.len() - batch.index,
                    "cancellation requested; not starting further batches"
                );
                break;
            }

            info!(batch = batch.index, units = ?batch.names(), "starting batch");
            let batch_results = executor.run_batch(batch).await;
            let failed = batch_results.iter().filter(|r| !r.success).count();
            info!(batch = batch.index, failed, "batch finished");

            on_batch(batch, &batch_results);
            results.extend(batch_results);
        }

        debug!(results = results.len(), "build run finished");
        results
    }
}
