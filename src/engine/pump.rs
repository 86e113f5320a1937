// src/engine/pump.rs

//! Output pump: turns one `ProcessHandle` into a stream of events.
//!
//! The pump runs as its own Tokio task and is the only owner of the
//! handle's output and exit channels. It is also the only place that clears
//! the slot after a normal exit, which happens before the final status
//! event is emitted.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::event::OrchestrationEvent;
use crate::exec::{ProcessHandle, UNKNOWN_EXIT_CODE};

use super::slot::{RunId, RunSlot};

/// Events buffered between the pump and a slow observer.
const EVENT_BUFFER: usize = 64;

/// Ordered, finite, single-use event stream of one run.
///
/// Ends right after the `Status("exit:<code>")` event.
#[derive(Debug)]
pub struct RunStream {
    run_id: RunId,
    rx: mpsc::Receiver<OrchestrationEvent>,
}

impl RunStream {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Next event, or `None` at end-of-stream.
    pub async fn next_event(&mut self) -> Option<OrchestrationEvent> {
        self.rx.recv().await
    }

    /// Drain the whole stream.
    pub async fn collect_events(mut self) -> Vec<OrchestrationEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }
}

impl Stream for RunStream {
    type Item = OrchestrationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Start pumping `handle` and return the observer side.
pub fn spawn_pump(run_id: RunId, handle: ProcessHandle, slot: Arc<RunSlot>) -> RunStream {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    tokio::spawn(pump(run_id, handle, slot, tx));
    RunStream { run_id, rx }
}

async fn pump(
    run_id: RunId,
    handle: ProcessHandle,
    slot: Arc<RunSlot>,
    tx: mpsc::Sender<OrchestrationEvent>,
) {
    let pid = handle.pid();
    let (mut output, exit, _control) = handle.into_parts();
    let mut observer = Observer::new(run_id, tx);

    observer.emit(OrchestrationEvent::starting()).await;

    while let Some(line) = output.recv().await {
        debug!(run_id, ?pid, "output: {}", line);
        observer.emit(OrchestrationEvent::log(line)).await;
    }

    let code = match exit.await {
        Ok(code) => code,
        Err(_) => {
            warn!(run_id, ?pid, "exit status lost; reporting unknown exit code");
            UNKNOWN_EXIT_CODE
        }
    };

    slot.clear(run_id);
    info!(run_id, ?pid, exit_code = code, "run finished; slot cleared");

    observer.emit(OrchestrationEvent::exit(code)).await;
}

/// Sending side of a run stream that tolerates the observer going away.
struct Observer {
    run_id: RunId,
    tx: mpsc::Sender<OrchestrationEvent>,
    attached: bool,
}

impl Observer {
    fn new(run_id: RunId, tx: mpsc::Sender<OrchestrationEvent>) -> Self {
        Self {
            run_id,
            tx,
            attached: true,
        }
    }

    async fn emit(&mut self, event: OrchestrationEvent) {
        if !self.attached {
            return;
        }
        if self.tx.send(event).await.is_err() {
            info!(
                run_id = self.run_id,
                "observer disconnected; draining run without a client"
            );
            self.attached = false;
        }
    }
}
