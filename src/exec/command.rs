// src/exec/command.rs

//! Shell-command build action.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::change::{ChangeGate, Marker};
use crate::exec::action::{ActionFuture, BuildAction, BuildOutcome};
use crate::plan::{BuildUnit, UnitName};

/// Number of trailing stderr lines kept for the failure message.
const STDERR_TAIL_LINES: usize = 5;

/// What to run for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCommand {
    pub cmd: String,
    /// Consult change detection and skip the command when nothing changed.
    pub skip_unchanged: bool,
}

impl UnitCommand {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            skip_unchanged: false,
        }
    }

    pub fn skip_unchanged(mut self, val: bool) -> Self {
        self.skip_unchanged = val;
        self
    }
}

/// Runs each unit's configured command through the platform shell with the
/// unit's source root as working directory.
///
/// A non-zero exit status is a failure. When a [`ChangeGate`] is attached
/// and the unit has `skip_unchanged`, an unchanged root is skipped and a
/// successful build rewrites the unit's marker under `marker_dir`.
#[derive(Debug)]
pub struct CommandAction {
    commands: HashMap<UnitName, UnitCommand>,
    marker_dir: PathBuf,
    gate: Option<ChangeGate>,
}

impl CommandAction {
    pub fn new(commands: HashMap<UnitName, UnitCommand>, marker_dir: impl Into<PathBuf>) -> Self {
        Self {
            commands,
            marker_dir: marker_dir.into(),
            gate: None,
        }
    }

    pub fn with_change_gate(mut self, gate: ChangeGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn marker_for(&self, unit: &BuildUnit) -> Marker {
        Marker::for_unit(&self.marker_dir, &unit.name)
    }

    fn gate_for(&self, command: &UnitCommand) -> Option<&ChangeGate> {
        if command.skip_unchanged {
            self.gate.as_ref()
        } else {
            None
        }
    }

    async fn run(&self, unit: &BuildUnit) -> Result<BuildOutcome> {
        let Some(command) = self.commands.get(&unit.name) else {
            bail!("no command configured for unit '{}'", unit.name);
        };

        let gate = self.gate_for(command);
        let marker = self.marker_for(unit);

        if let Some(gate) = gate {
            let changed = {
                let gate = gate.clone();
                let root = unit.source_root.clone();
                let marker = marker.clone();
                tokio::task::spawn_blocking(move || gate.has_changes(&root, &marker))
                    .await
                    .context("running change detection")?
            };
            if !changed {
                info!(unit = %unit.name, "no changes since last successful build; skipping");
                return Ok(BuildOutcome::Skipped);
            }
        }

        run_shell(&unit.name, &command.cmd, &unit.source_root).await?;

        if let Some(gate) = gate {
            let gate = gate.clone();
            let root = unit.source_root.clone();
            let stamped = tokio::task::spawn_blocking(move || gate.mark_up_to_date(&root, &marker))
                .await
                .context("updating change marker")?;
            // The build itself succeeded; a stale marker only costs a rebuild.
            if let Err(err) = stamped {
                warn!(unit = %unit.name, error = %err, "failed to update change marker");
            }
        }

        Ok(BuildOutcome::Built)
    }
}

impl BuildAction for CommandAction {
    fn build<'a>(&'a self, unit: &'a BuildUnit) -> ActionFuture<'a> {
        Box::pin(self.run(unit))
    }
}

/// Run `cmd` through the platform shell inside `dir`.
///
/// stdout is logged at debug level; stderr too, and its last lines are
/// appended to the error when the command fails.
async fn run_shell(unit: &str, cmd: &str, dir: &Path) -> Result<()> {
    info!(unit = %unit, cmd = %cmd, dir = ?dir, "starting unit command");

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning `{cmd}` for unit '{unit}'"))?;

    let stdout_task = child.stdout.take().map(|stdout| {
        let unit = unit.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(unit = %unit, "stdout: {}", line);
            }
        })
    });

    let stderr_task = child.stderr.take().map(|stderr| {
        let unit = unit.to_string();
        tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(unit = %unit, "stderr: {}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            tail
        })
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for `{cmd}` of unit '{unit}'"))?;

    if let Some(task) = stdout_task {
        let _ = task.await;
    }
    let stderr_tail = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => VecDeque::new(),
    };

    debug!(unit = %unit, success = status.success(), code = ?status.code(), "unit command exited");

    if status.success() {
        return Ok(());
    }

    let code = status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    let mut message = format!("`{cmd}` exited with code {code}");
    if !stderr_tail.is_empty() {
        let tail: Vec<String> = stderr_tail.into_iter().collect();
        message.push_str(": ");
        message.push_str(&tail.join("\n"));
    }
    bail!(message)
}
