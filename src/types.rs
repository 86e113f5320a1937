// src/types.rs

//! Request and outcome types shared by the engine and the HTTP layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single credential entry as submitted with a run request.
///
/// Keys are trimmed when the environment overlay is derived; values are
/// passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub key: String,
    pub value: String,
}

impl Credential {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Input of `RunCoordinator::start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub task: String,
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl RunRequest {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            credentials: Vec::new(),
        }
    }

    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.push(Credential::new(key, value));
        self
    }

    /// The trimmed task description, or `None` when it is blank.
    pub fn normalized_task(&self) -> Option<&str> {
        let task = self.task.trim();
        (!task.is_empty()).then_some(task)
    }
}

/// Result of `RunCoordinator::stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// An interrupt was (or already had been) sent to the live process.
    Delivered,
    /// Nothing was running, or the process vanished before the signal landed.
    NotRunning,
}

impl StopOutcome {
    pub fn stopped(self) -> bool {
        matches!(self, StopOutcome::Delivered)
    }
}

/// Coarse lifecycle of the run coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// No run holds the slot.
    Idle,
    /// Admitted; the process is being spawned.
    Starting,
    /// The process is alive (or draining) and its output is being pumped.
    Streaming,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Starting => "starting",
            RunState::Streaming => "streaming",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
