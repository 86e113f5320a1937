// src/exec/command.rs

//! Building the concrete command line for a run.
//!
//! A [`CommandTemplate`] is the static part (program, fixed args, working
//! directory, extra environment); each accepted run turns it into a
//! [`LaunchSpec`] by appending the task and overlaying credentials.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::types::Credential;

/// Prefix joined with each credential key to form its environment variable.
pub const DEFAULT_CREDENTIAL_PREFIX: &str = "CRED_";

/// Everything a launcher needs to start one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Entries overlaid on top of the inherited process environment.
    pub env: BTreeMap<String, String>,
    pub working_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    /// Preferred executable. Relative paths are first looked up inside
    /// `working_dir`.
    pub program: String,
    /// Used when `program` does not exist inside `working_dir`.
    pub fallback_program: Option<String>,
    /// Fixed arguments; the task description is appended after them.
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub credential_prefix: String,
}

impl CommandTemplate {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            fallback_program: None,
            args: Vec::new(),
            working_dir: working_dir.into(),
            env: BTreeMap::new(),
            credential_prefix: DEFAULT_CREDENTIAL_PREFIX.to_string(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fallback(mut self, program: impl Into<String>) -> Self {
        self.fallback_program = Some(program.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_credential_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.credential_prefix = prefix.into();
        self
    }

    /// Pick the executable: a project-local `program` if it exists, else the
    /// fallback, else `program` as given (resolved through `PATH`).
    pub fn resolve_program(&self) -> PathBuf {
        let primary = Path::new(&self.program);
        let local = if primary.is_absolute() {
            primary.to_path_buf()
        } else {
            self.working_dir.join(primary)
        };

        if local.is_file() {
            return local;
        }

        match &self.fallback_program {
            Some(fallback) => PathBuf::from(fallback),
            None => primary.to_path_buf(),
        }
    }

    /// Concrete spec for one run. `task` is expected to be trimmed already.
    pub fn launch_spec(&self, task: &str, credentials: &[Credential]) -> LaunchSpec {
        let mut args = self.args.clone();
        args.push(task.to_string());

        let mut env = self.env.clone();
        env.extend(credential_overlay(&self.credential_prefix, credentials));

        LaunchSpec {
            program: self.resolve_program(),
            args,
            env,
            working_dir: self.working_dir.clone(),
        }
    }
}

/// Derive the credential part of the environment overlay.
///
/// Keys are trimmed, blank keys are dropped and a later duplicate replaces
/// an earlier one.
pub fn credential_overlay(prefix: &str, credentials: &[Credential]) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    for credential in credentials {
        let key = credential.key.trim();
        if key.is_empty() {
            continue;
        }
        env.insert(format!("{prefix}{key}"), credential.value.clone());
    }
    env
}
