// src/lib.rs

pub mod change;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod plan;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::change::ChangeGate;
use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::engine::{CancellationFlag, ScheduleRunner};
use crate::exec::{CommandAction, ConcurrencyLimit, ExecutionResult, RunTally, all_succeeded};
use crate::fs::RealFileSystem;
use crate::plan::{Batch, IndependenceAnalyzer};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - batch planning (`--plan` stops here)
/// - the shell-command build action and its change gate
/// - the schedule runner
/// - Ctrl-C and `--fail-fast` cancellation
///
/// Returns `Ok(true)` iff every unit succeeded (or was skipped).
pub async fn run(args: CliArgs) -> Result<bool> {
    let cfg = load_and_validate(&args.config)?;

    let units = cfg.build_units();
    let requested = args
        .parallelism
        .unwrap_or(cfg.config_section().parallelism);
    let limit = ConcurrencyLimit::from_requested(requested);
    let runner = ScheduleRunner::new(limit).with_path_case(cfg.path_case());

    if args.plan {
        print_plan(&cfg, &runner.plan(&units), args.json)?;
        return Ok(true);
    }

    let action = build_action(&cfg, args.force)?;

    let cancel = CancellationFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; finishing the current batch");
            cancel.cancel();
        });
    }

    let fail_fast = args.fail_fast;
    let results = runner
        .run_observed(&units, Arc::new(action), &cancel, |batch, batch_results| {
            if fail_fast && batch_results.iter().any(|r| !r.success) {
                warn!(batch = batch.index, "unit failed with --fail-fast; cancelling remaining batches");
                cancel.cancel();
            }
        })
        .await;

    print_results(&results, args.json)?;
    Ok(all_succeeded(&results))
}

fn build_action(cfg: &ConfigFile, force: bool) -> Result<CommandAction> {
    let action = CommandAction::new(cfg.unit_commands(), cfg.marker_dir());
    if force {
        debug!("--force given; change detection disabled");
        return Ok(action);
    }

    let gate = ChangeGate::new(
        cfg.change_strategy(),
        Arc::new(RealFileSystem),
        cfg.source_filter()?,
    );
    Ok(action.with_change_gate(gate))
}

fn print_plan(cfg: &ConfigFile, batches: &[Batch], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(batches)?);
        return Ok(());
    }

    let units = cfg.build_units();
    println!("wavebuild plan");
    println!("  units = {}", units.len());
    println!("  batches = {}", batches.len());
    println!();

    for batch in batches {
        println!("batch {} ({} units):", batch.index, batch.len());
        for unit in batch.units() {
            println!("  - {}  {}", unit.name, unit.source_root.display());
        }
    }

    let pairs = IndependenceAnalyzer::new(cfg.path_case()).overlapping_pairs(&units);
    if !pairs.is_empty() {
        println!();
        println!("overlapping roots:");
        for (a, b) in pairs {
            println!("  {a} <-> {b}");
        }
    }

    debug!("plan complete (no execution)");
    Ok(())
}

fn print_results(results: &[ExecutionResult], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    for r in results {
        let status = match (r.success, r.skipped) {
            (false, _) => "FAILED",
            (true, true) => "skipped",
            (true, false) => "ok",
        };
        println!(
            "{:<8} {:<24} {:>8.2}s",
            status,
            r.name,
            r.duration.as_secs_f64()
        );
        if let Some(err) = &r.error {
            for line in err.lines() {
                println!("         {line}");
            }
        }
    }

    let tally = RunTally::from_results(results);
    println!(
        "{} units: {} built, {} skipped, {} failed",
        tally.total, tally.built, tally.skipped, tally.failed
    );
    Ok(())
}
