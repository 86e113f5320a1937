// src/event/mod.rs

//! Orchestration events and their wire encoding.
//!
//! - [`OrchestrationEvent`] is what the run coordinator emits, in strict
//!   chronological order, for a single run.
//! - [`encoder`] turns events into self-delimiting text frames for a
//!   streaming client.

pub mod encoder;

pub use encoder::{encode, encode_frame};

use crate::exec::ExitCode;

/// Status payload of the first event of every run.
pub const STATUS_STARTING: &str = "starting";

/// One event of a run's live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationEvent {
    Status(String),
    Log(String),
}

impl OrchestrationEvent {
    pub fn starting() -> Self {
        OrchestrationEvent::Status(STATUS_STARTING.to_string())
    }

    pub fn exit(code: ExitCode) -> Self {
        OrchestrationEvent::Status(format!("exit:{code}"))
    }

    pub fn log(line: impl Into<String>) -> Self {
        OrchestrationEvent::Log(line.into())
    }

    /// Event type marker used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestrationEvent::Status(_) => "status",
            OrchestrationEvent::Log(_) => "log",
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            OrchestrationEvent::Status(text) | OrchestrationEvent::Log(text) => text,
        }
    }

    /// Parse the exit code out of a final `Status("exit:<code>")` event.
    pub fn exit_code(&self) -> Option<ExitCode> {
        match self {
            OrchestrationEvent::Status(text) => text.strip_prefix("exit:")?.parse().ok(),
            OrchestrationEvent::Log(_) => None,
        }
    }
}
