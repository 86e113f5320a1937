// src/engine/coordinator.rs

//! The run coordinator: single-flight admission plus start/stop control.
//!
//! `Idle -> Starting -> Streaming -> Idle`. There is no stopping state: a
//! stop only asks the process to exit, and that exit is observed by the
//! pump through the same path as any other termination.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::RunError;
use crate::exec::{CommandTemplate, InterruptOutcome, ProcessControl, ProcessLauncher};
use crate::types::{RunRequest, RunState, StopOutcome};

use super::pump::{RunStream, spawn_pump};
use super::slot::{RunId, RunSlot, StopTarget};

/// Cheap to clone; all clones share one slot.
#[derive(Clone)]
pub struct RunCoordinator {
    slot: Arc<RunSlot>,
    launcher: Arc<dyn ProcessLauncher>,
    template: Arc<CommandTemplate>,
}

impl fmt::Debug for RunCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunCoordinator")
            .field("slot", &self.slot)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

impl RunCoordinator {
    pub fn new<L>(launcher: L, template: CommandTemplate) -> Self
    where
        L: ProcessLauncher + 'static,
    {
        Self::with_slot(Arc::new(launcher), template, Arc::new(RunSlot::new()))
    }

    /// Build a coordinator around an existing slot.
    pub fn with_slot(
        launcher: Arc<dyn ProcessLauncher>,
        template: CommandTemplate,
        slot: Arc<RunSlot>,
    ) -> Self {
        Self {
            slot,
            launcher,
            template: Arc::new(template),
        }
    }

    pub fn slot(&self) -> &Arc<RunSlot> {
        &self.slot
    }

    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }

    pub fn state(&self) -> RunState {
        self.slot.state()
    }

    /// Admit and spawn a new run.
    ///
    /// Must be called from inside a Tokio runtime: the returned stream is fed
    /// by a spawned pump task.
    pub fn start(&self, request: &RunRequest) -> Result<RunStream, RunError> {
        let task = request.normalized_task().ok_or(RunError::InvalidArgument)?;

        let Some(run_id) = self.slot.try_admit() else {
            debug!("start rejected; a run is already active");
            return Err(RunError::AlreadyRunning);
        };

        let spec = self.template.launch_spec(task, &request.credentials);
        info!(
            run_id,
            program = %spec.program.display(),
            credentials = request.credentials.len(),
            "run admitted"
        );

        let handle = match self.launcher.launch(&spec) {
            Ok(handle) => handle,
            Err(err) => {
                self.slot.clear(run_id);
                warn!(run_id, error = %err, "run failed to start; slot released");
                return Err(err);
            }
        };

        self.slot.install(run_id, handle.control());

        Ok(spawn_pump(run_id, handle, Arc::clone(&self.slot)))
    }

    /// Ask the active process to terminate. Never waits for it to exit.
    ///
    /// A stop that lands while the run is still spawning waits for the spawn
    /// to finish: it interrupts the new process, or reports `NotRunning` if
    /// no process came out of it.
    pub async fn stop(&self) -> StopOutcome {
        match self.slot.stop_target() {
            StopTarget::Idle => {
                debug!("stop requested with no active run");
                StopOutcome::NotRunning
            }
            StopTarget::Deferred { run_id, installed } => {
                info!(run_id, "stop requested while starting; waiting for spawn");
                match installed.await {
                    Ok(control) => self.interrupt(run_id, control).await,
                    Err(_) => {
                        info!(run_id, "run failed to start; nothing to stop");
                        StopOutcome::NotRunning
                    }
                }
            }
            StopTarget::Live { run_id, control } => self.interrupt(run_id, control).await,
        }
    }

    async fn interrupt(&self, run_id: RunId, control: ProcessControl) -> StopOutcome {
        match control.interrupt().await {
            InterruptOutcome::Delivered => {
                info!(run_id, pid = ?control.pid(), "stop signal delivered");
                StopOutcome::Delivered
            }
            InterruptOutcome::AlreadyRequested => {
                debug!(run_id, "stop already requested for this run");
                StopOutcome::Delivered
            }
            InterruptOutcome::NotRunning => {
                // The pump clears it too once it sees the exit code.
                self.slot.clear_if_stale(run_id);
                info!(run_id, "process vanished before stop signal landed");
                StopOutcome::NotRunning
            }
        }
    }
}
