// src/engine/slot.rs

//! The single-flight run slot.
//!
//! Every read and write goes through one mutex, and the lock is never held
//! across an `.await`. Removal is keyed by `RunId` so a late clear from an
//! old run can never evict a newer one.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::exec::ProcessControl;
use crate::types::RunState;

/// Monotonic identifier of an admitted run.
pub type RunId = u64;

#[derive(Debug)]
enum SlotState {
    Empty,
    Starting {
        run_id: RunId,
        /// Stops that arrived before the process existed.
        stop_waiters: Vec<oneshot::Sender<ProcessControl>>,
    },
    Running {
        run_id: RunId,
        control: ProcessControl,
    },
}

#[derive(Debug)]
struct SlotInner {
    state: SlotState,
    last_run_id: RunId,
}

/// What `stop` found in the slot.
#[derive(Debug)]
pub enum StopTarget {
    /// Nothing live (a stale entry, if any, has been cleared).
    Idle,
    /// The run is still spawning. `installed` yields its control once the
    /// process exists, or closes if the spawn fails.
    Deferred {
        run_id: RunId,
        installed: oneshot::Receiver<ProcessControl>,
    },
    /// A live process to interrupt.
    Live {
        run_id: RunId,
        control: ProcessControl,
    },
}

#[derive(Debug)]
pub struct RunSlot {
    inner: Mutex<SlotInner>,
}

impl Default for RunSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSlot {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                state: SlotState::Empty,
                last_run_id: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically claim the slot for a new run.
    ///
    /// Succeeds when the slot is empty or holds a process that has already
    /// exited; returns `None` while another run is starting or alive.
    pub fn try_admit(&self) -> Option<RunId> {
        let mut inner = self.lock();

        match &inner.state {
            SlotState::Empty => {}
            SlotState::Running { run_id, control } if !control.is_running() => {
                debug!(run_id, "replacing stale run in slot");
            }
            SlotState::Starting { .. } | SlotState::Running { .. } => return None,
        }

        inner.last_run_id += 1;
        let run_id = inner.last_run_id;
        inner.state = SlotState::Starting {
            run_id,
            stop_waiters: Vec::new(),
        };
        Some(run_id)
    }

    /// Move an admitted run from `Starting` to `Running` and hand its
    /// control to every stop that was waiting for it.
    pub fn install(&self, run_id: RunId, control: ProcessControl) {
        let mut inner = self.lock();

        let waiters = match &mut inner.state {
            SlotState::Starting {
                run_id: current,
                stop_waiters,
            } if *current == run_id => std::mem::take(stop_waiters),
            _ => {
                warn!(run_id, "install for a run that no longer owns the slot");
                return;
            }
        };

        inner.state = SlotState::Running {
            run_id,
            control: control.clone(),
        };
        drop(inner);

        if !waiters.is_empty() {
            debug!(run_id, waiting = waiters.len(), "releasing stops queued while starting");
        }
        for waiter in waiters {
            let _ = waiter.send(control.clone());
        }
    }

    /// Empty the slot if it still belongs to `run_id`.
    pub fn clear(&self, run_id: RunId) -> bool {
        let mut inner = self.lock();
        if inner.owner() == Some(run_id) {
            inner.state = SlotState::Empty;
            true
        } else {
            false
        }
    }

    /// Empty the slot if it belongs to `run_id` and that process has exited.
    pub fn clear_if_stale(&self, run_id: RunId) -> bool {
        let mut inner = self.lock();
        let stale = matches!(
            &inner.state,
            SlotState::Running { run_id: current, control }
                if *current == run_id && !control.is_running()
        );
        if stale {
            inner.state = SlotState::Empty;
        }
        stale
    }

    /// Inspect the slot on behalf of `stop`.
    pub fn stop_target(&self) -> StopTarget {
        let mut inner = self.lock();

        if let SlotState::Running { run_id, control } = &inner.state
            && !control.is_running()
        {
            debug!(run_id = *run_id, "clearing stale run on stop");
            inner.state = SlotState::Empty;
            return StopTarget::Idle;
        }

        match &mut inner.state {
            SlotState::Empty => StopTarget::Idle,
            SlotState::Starting {
                run_id,
                stop_waiters,
            } => {
                let (tx, installed) = oneshot::channel();
                stop_waiters.push(tx);
                StopTarget::Deferred {
                    run_id: *run_id,
                    installed,
                }
            }
            SlotState::Running { run_id, control } => StopTarget::Live {
                run_id: *run_id,
                control: control.clone(),
            },
        }
    }

    pub fn state(&self) -> RunState {
        match self.lock().state {
            SlotState::Empty => RunState::Idle,
            SlotState::Starting { .. } => RunState::Starting,
            SlotState::Running { .. } => RunState::Streaming,
        }
    }

    /// Run currently owning the slot, if any.
    pub fn current_run(&self) -> Option<RunId> {
        self.lock().owner()
    }

    pub fn is_empty(&self) -> bool {
        self.current_run().is_none()
    }
}

impl SlotInner {
    fn owner(&self) -> Option<RunId> {
        match self.state {
            SlotState::Empty => None,
            SlotState::Starting { run_id, .. } | SlotState::Running { run_id, .. } => Some(run_id),
        }
    }
}
