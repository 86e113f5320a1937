// src/exec/task_runner.rs

//! Supervisor for a single task process.

use tokio::process::Child;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::handle::{ExitCode, InterruptReceiver, UNKNOWN_EXIT_CODE};
use super::signal;

/// Own `child` until it exits, serving interrupt requests meanwhile.
///
/// - Every interrupt request is answered with whether the signal landed.
/// - The exit code is published exactly once on `exit_tx`.
/// - `interrupts` is dropped right after, which is what flips
///   `ProcessControl::is_running` to false.
///
/// No escalation to SIGKILL: an interrupted process that ignores SIGINT is
/// waited on for as long as it keeps running.
pub async fn supervise(
    mut child: Child,
    mut interrupts: InterruptReceiver,
    exit_tx: oneshot::Sender<ExitCode>,
) {
    let pid = child.id();

    let code = loop {
        tokio::select! {
            status = child.wait() => {
                break match status {
                    Ok(status) => signal::exit_code(status),
                    Err(e) => {
                        error!(?pid, error = %e, "waiting for task process failed");
                        UNKNOWN_EXIT_CODE
                    }
                };
            }

            Some(request) = interrupts.recv() => {
                match signal::interrupt(&mut child) {
                    Ok(()) => {
                        info!(?pid, "interrupt delivered to task process");
                        request.acknowledge(true);
                    }
                    Err(e) => {
                        warn!(?pid, error = %e, "interrupt delivery failed");
                        request.acknowledge(false);
                    }
                }
            }
        }
    };

    info!(?pid, exit_code = code, "task process exited");
    if exit_tx.send(code).is_err() {
        debug!(?pid, "exit status receiver dropped");
    }
    drop(interrupts);
}
