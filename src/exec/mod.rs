// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually starting the external task with
//! `tokio::process::Command` and exposing it as a [`ProcessHandle`].
//!
//! - [`backend`] provides the `ProcessLauncher` trait and the production
//!   `CommandLauncher`; tests replace it with a scripted launcher.
//! - [`command`] builds the per-run command line and environment overlay.
//! - [`handle`] holds the handle/control types shared with the coordinator.
//! - [`task_runner`] owns a spawned child until it exits.
//! - [`output`] and [`signal`] are the byte-level and platform helpers.

pub mod backend;
pub mod command;
pub mod handle;
pub mod output;
pub mod signal;
pub mod task_runner;

pub use backend::{CommandLauncher, ProcessLauncher};
pub use command::{CommandTemplate, DEFAULT_CREDENTIAL_PREFIX, LaunchSpec, credential_overlay};
pub use handle::{
    ExitCode, InterruptOutcome, InterruptReceiver, InterruptRequest, ProcessControl,
    ProcessHandle, UNKNOWN_EXIT_CODE,
};
