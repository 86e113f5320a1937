// src/exec/handle.rs

//! Ownership-bearing handle to one spawned task process.
//!
//! A handle is three independent channels:
//! - output lines (combined stdout + stderr), consumed by exactly one pump
//! - the exit code, published once when the process terminates
//! - a [`ProcessControl`] that can be cloned freely and used to interrupt
//!   the process or ask whether it is still alive
//!
//! The process itself is owned by a supervisor task on the other side of
//! these channels, so callers never touch the `Child` directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};

/// Integer exit status of a task process. Signal terminations are reported
/// as the negated signal number.
pub type ExitCode = i32;

/// Exit code reported when the real status could not be observed.
pub const UNKNOWN_EXIT_CODE: ExitCode = -1;

/// What happened to an interrupt request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// The signal was sent just now.
    Delivered,
    /// A previous request already signalled this (still live) process.
    AlreadyRequested,
    /// The process had already exited or vanished.
    NotRunning,
}

/// A single interrupt request travelling to the process supervisor.
#[derive(Debug)]
pub struct InterruptRequest {
    reply: oneshot::Sender<bool>,
}

impl InterruptRequest {
    /// Report whether the signal actually reached the process.
    pub fn acknowledge(self, delivered: bool) {
        let _ = self.reply.send(delivered);
    }
}

/// Supervisor side of a [`ProcessControl`].
///
/// Dropping it marks the process as no longer running.
#[derive(Debug)]
pub struct InterruptReceiver {
    rx: mpsc::Receiver<InterruptRequest>,
}

impl InterruptReceiver {
    pub async fn recv(&mut self) -> Option<InterruptRequest> {
        self.rx.recv().await
    }
}

/// Cloneable interrupt + liveness capability for one process.
#[derive(Debug, Clone)]
pub struct ProcessControl {
    pid: Option<u32>,
    requests: mpsc::Sender<InterruptRequest>,
    requested: Arc<AtomicBool>,
}

impl ProcessControl {
    /// Create a control and the receiver its supervisor listens on.
    pub fn channel(pid: Option<u32>) -> (Self, InterruptReceiver) {
        let (tx, rx) = mpsc::channel(4);
        let control = Self {
            pid,
            requests: tx,
            requested: Arc::new(AtomicBool::new(false)),
        };
        (control, InterruptReceiver { rx })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// True until the supervisor has observed termination.
    pub fn is_running(&self) -> bool {
        !self.requests.is_closed()
    }

    /// Ask the process to terminate. Idempotent: only the first request on a
    /// live process sends a signal.
    pub async fn interrupt(&self) -> InterruptOutcome {
        if !self.is_running() {
            return InterruptOutcome::NotRunning;
        }
        if self.requested.swap(true, Ordering::SeqCst) {
            return InterruptOutcome::AlreadyRequested;
        }

        let (reply, delivered) = oneshot::channel();
        if self.requests.send(InterruptRequest { reply }).await.is_err() {
            return InterruptOutcome::NotRunning;
        }

        // A dropped reply means the supervisor exited before handling us.
        match delivered.await {
            Ok(true) => InterruptOutcome::Delivered,
            Ok(false) | Err(_) => InterruptOutcome::NotRunning,
        }
    }
}

/// One spawned external task instance.
#[derive(Debug)]
pub struct ProcessHandle {
    output: mpsc::Receiver<String>,
    exit: oneshot::Receiver<ExitCode>,
    control: ProcessControl,
}

impl ProcessHandle {
    pub fn new(
        output: mpsc::Receiver<String>,
        exit: oneshot::Receiver<ExitCode>,
        control: ProcessControl,
    ) -> Self {
        Self {
            output,
            exit,
            control,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.control.pid()
    }

    pub fn control(&self) -> ProcessControl {
        self.control.clone()
    }

    pub fn into_parts(
        self,
    ) -> (
        mpsc::Receiver<String>,
        oneshot::Receiver<ExitCode>,
        ProcessControl,
    ) {
        (self.output, self.exit, self.control)
    }
}
