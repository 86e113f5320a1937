use std::collections::VecDeque;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentrun::errors::RunError;
use agentrun::exec::{
    ExitCode, InterruptReceiver, LaunchSpec, ProcessControl, ProcessHandle, ProcessLauncher,
};
use tokio::sync::{mpsc, oneshot};

/// A launcher that never touches the OS.
///
/// Every successful `launch`:
/// - records the `LaunchSpec` it was given
/// - queues a [`FakeProcess`] the test drives by hand (write lines, wait for
///   an interrupt, exit with a code)
///
/// Clones share state, so a test keeps one clone and hands another to the
/// coordinator.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    launched: Vec<LaunchSpec>,
    processes: VecDeque<FakeProcess>,
    spawn_failures: VecDeque<String>,
    held_launches: VecDeque<HeldLaunch>,
    next_pid: u32,
}

/// Launcher side of a [`LaunchGate`].
struct HeldLaunch {
    entered: std_mpsc::Sender<()>,
    release: std_mpsc::Receiver<()>,
}

/// Test side of a launch that blocks until released.
///
/// While a launch is held the coordinator sits in the `Starting` state,
/// which is otherwise too short to observe.
pub struct LaunchGate {
    entered: std_mpsc::Receiver<()>,
    release: std_mpsc::Sender<()>,
}

impl LaunchGate {
    /// Block until the held launch has started.
    pub fn wait_entered(&self) {
        self.entered
            .recv_timeout(Duration::from_secs(5))
            .expect("held launch never started");
    }

    /// Let the held launch finish (succeed, or fail if a spawn failure is
    /// queued).
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `launch` fail with `SpawnFailed(reason)`.
    pub fn fail_next_spawn(&self, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .spawn_failures
            .push_back(reason.to_string());
    }

    /// Make the next `launch` block until the returned gate is released.
    ///
    /// The blocked call occupies its thread, so drive `start` from
    /// `spawn_blocking` on a multi-thread runtime.
    pub fn hold_next_launch(&self) -> LaunchGate {
        let (entered_tx, entered_rx) = std_mpsc::channel();
        let (release_tx, release_rx) = std_mpsc::channel();
        self.state.lock().unwrap().held_launches.push_back(HeldLaunch {
            entered: entered_tx,
            release: release_rx,
        });
        LaunchGate {
            entered: entered_rx,
            release: release_tx,
        }
    }

    /// Specs of every successful launch so far, oldest first.
    pub fn launched(&self) -> Vec<LaunchSpec> {
        self.state.lock().unwrap().launched.clone()
    }

    /// Take the oldest process not yet claimed by the test.
    pub fn take_process(&self) -> FakeProcess {
        self.state
            .lock()
            .unwrap()
            .processes
            .pop_front()
            .expect("no fake process was launched")
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&self, spec: &LaunchSpec) -> Result<ProcessHandle, RunError> {
        let held = self.state.lock().unwrap().held_launches.pop_front();
        if let Some(held) = held {
            let _ = held.entered.send(());
            let _ = held.release.recv_timeout(Duration::from_secs(5));
        }

        let mut state = self.state.lock().unwrap();

        if let Some(reason) = state.spawn_failures.pop_front() {
            return Err(RunError::SpawnFailed(reason));
        }

        state.next_pid += 1;
        let pid = 10_000 + state.next_pid;

        let (output_tx, output_rx) = mpsc::channel(64);
        let (exit_tx, exit_rx) = oneshot::channel();
        let (control, interrupts) = ProcessControl::channel(Some(pid));

        state.launched.push(spec.clone());
        state.processes.push_back(FakeProcess {
            pid,
            output: Some(output_tx),
            exit: Some(exit_tx),
            interrupts: Some(interrupts),
        });

        Ok(ProcessHandle::new(output_rx, exit_rx, control))
    }
}

/// Test-side controller of one fake process.
pub struct FakeProcess {
    pid: u32,
    output: Option<mpsc::Sender<String>>,
    exit: Option<oneshot::Sender<ExitCode>>,
    interrupts: Option<InterruptReceiver>,
}

impl FakeProcess {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Emit one output line.
    pub async fn write_line(&self, line: &str) {
        if let Some(tx) = &self.output {
            tx.send(line.to_string())
                .await
                .expect("pump dropped the output receiver");
        }
    }

    /// Wait for the next interrupt request and acknowledge it as delivered.
    pub async fn wait_for_interrupt(&mut self) {
        let interrupts = self
            .interrupts
            .as_mut()
            .expect("process already exited");
        let request = interrupts
            .recv()
            .await
            .expect("all process controls dropped");
        request.acknowledge(true);
    }

    /// Close output, publish `code` and mark the process as gone.
    pub fn exit(mut self, code: ExitCode) {
        self.output.take();
        if let Some(exit) = self.exit.take() {
            let _ = exit.send(code);
        }
        self.interrupts.take();
    }

    /// Mark the process as gone without closing output or reporting a code,
    /// like a child that was reaped behind the coordinator's back.
    pub fn vanish(&mut self) {
        self.interrupts.take();
    }
}
