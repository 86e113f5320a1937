// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Rejections reported synchronously by `RunCoordinator::start`.
///
/// None of these leave a claimed run slot behind. Once a run has been
/// admitted and its process spawned, the coordinator no longer fails: a
/// non-zero exit is reported as the final status event of the stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("task is required")]
    InvalidArgument,

    #[error("Task already running")]
    AlreadyRunning,

    #[error("spawn failed: {0}")]
    SpawnFailed(String),
}

pub type Result<T> = std::result::Result<T, AgentrunError>;
