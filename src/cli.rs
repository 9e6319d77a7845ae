// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `wavebuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wavebuild",
    version,
    about = "Build independent project groups in parallel waves without overlapping source trees.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Wavebuild.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Wavebuild.toml")]
    pub config: String,

    /// Maximum number of units building at once within a batch.
    ///
    /// Zero or negative means the number of available CPUs. Overrides
    /// `[config].parallelism`.
    #[arg(
        long,
        short = 'j',
        value_name = "N",
        env = "WAVEBUILD_PARALLELISM",
        allow_negative_numbers = true
    )]
    pub parallelism: Option<i64>,

    /// Print the batch plan and exit without building anything.
    #[arg(long)]
    pub plan: bool,

    /// Build every unit even if change detection says it is up to date.
    #[arg(long)]
    pub force: bool,

    /// Stop before the next batch once any unit has failed.
    #[arg(long)]
    pub fail_fast: bool,

    /// Print the plan or the results as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WAVEBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
