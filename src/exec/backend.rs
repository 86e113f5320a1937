// src/exec/backend.rs

//! Pluggable process launcher abstraction.
//!
//! The run coordinator talks to a `ProcessLauncher` instead of spawning
//! processes itself. Production code uses [`CommandLauncher`]; tests can
//! provide a launcher that hands out scripted handles and never touches the
//! operating system.

use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::errors::RunError;

use super::command::LaunchSpec;
use super::handle::{ProcessControl, ProcessHandle};
use super::output::merged_pipe;
use super::task_runner::supervise;

/// Capacity of the combined output line channel.
const OUTPUT_BUFFER: usize = 64;

/// Trait abstracting how task processes are started.
///
/// `launch` is called while a run is in the `Starting` state and must not
/// block; any long-running work belongs to tasks spawned from it. It is
/// always called from inside a Tokio runtime.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, spec: &LaunchSpec) -> Result<ProcessHandle, RunError>;
}

/// Real launcher built on `tokio::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandLauncher;

impl ProcessLauncher for CommandLauncher {
    fn launch(&self, spec: &LaunchSpec) -> Result<ProcessHandle, RunError> {
        info!(
            program = %spec.program.display(),
            args = ?spec.args,
            cwd = %spec.working_dir.display(),
            overlay = spec.env.len(),
            "spawning task process"
        );

        let spawn_failed = |e: std::io::Error| {
            warn!(program = %spec.program.display(), error = %e, "spawn failed");
            RunError::SpawnFailed(format!("{}: {e}", spec.program.display()))
        };

        // One pipe for both streams keeps stdout and stderr lines in write order.
        let (output, writers) = merged_pipe().map_err(spawn_failed)?;

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(&spec.env)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(writers.stdout)
            .stderr(writers.stderr);

        let spawned = cmd.spawn();
        // The command owns the parent's copies of the write end.
        drop(cmd);
        let child = spawned.map_err(spawn_failed)?;

        let pid = child.id();
        let (line_tx, line_rx) = mpsc::channel(OUTPUT_BUFFER);
        output.spawn_reader(pid, line_tx);

        let (control, interrupts) = ProcessControl::channel(pid);
        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(supervise(child, interrupts, exit_tx));

        info!(?pid, "task process started");
        Ok(ProcessHandle::new(line_rx, exit_rx, control))
    }
}
