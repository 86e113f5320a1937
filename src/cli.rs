// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::RawConfigFile;

/// Command-line arguments for `agentrun`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "agentrun",
    version,
    about = "Run an automation agent one task at a time and stream its output over HTTP.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML). Built-in defaults are used when omitted.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen on, overriding `[server].bind`.
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Directory the task runs in, overriding `[runner].working_dir`.
    #[arg(long, value_name = "PATH")]
    pub working_dir: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `AGENTRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the effective configuration and exit without serving.
    #[arg(long)]
    pub print_config: bool,
}

impl CliArgs {
    /// Apply command-line overrides on top of a file (or default) config.
    pub fn apply_overrides(&self, raw: &mut RawConfigFile) {
        if let Some(bind) = &self.bind {
            raw.server.bind = bind.clone();
        }
        if let Some(dir) = &self.working_dir {
            raw.runner.working_dir = Some(dir.clone());
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
