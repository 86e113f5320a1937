// src/engine/mod.rs

//! Orchestration engine.
//!
//! - [`slot`] holds the single-flight `RunSlot`.
//! - [`coordinator`] implements `start` / `stop` on top of the slot and a
//!   `ProcessLauncher`.
//! - [`pump`] streams one process's output as `OrchestrationEvent`s.

pub mod coordinator;
pub mod pump;
pub mod slot;

pub use coordinator::RunCoordinator;
pub use pump::RunStream;
pub use slot::{RunId, RunSlot, StopTarget};
pub use crate::types::{RunState, StopOutcome};
