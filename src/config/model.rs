// src/config/model.rs

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

use crate::exec::{CommandTemplate, DEFAULT_CREDENTIAL_PREFIX};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [server]
/// bind = "127.0.0.1:8000"
/// cors_origins = ["http://localhost:5173"]
///
/// [runner]
/// program = ".venv/bin/python"
/// fallback_program = "python3"
/// args = ["run_task.py"]
/// working_dir = "/srv/agent"
/// credential_prefix = "CRED_"
///
/// [runner.env]
/// PYTHONUNBUFFERED = "1"
/// ```
///
/// Every section is optional; the defaults reproduce a Python task runner
/// living next to the server.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub runner: RunnerSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Browser origins allowed to call the API. An empty list disables CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunnerSection {
    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_fallback_program")]
    pub fallback_program: Option<String>,

    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Defaults to the server's current directory.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default = "default_credential_prefix")]
    pub credential_prefix: String,

    /// Static entries added to every task's environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            fallback_program: default_fallback_program(),
            args: default_args(),
            working_dir: None,
            credential_prefix: default_credential_prefix(),
            env: BTreeMap::new(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

fn default_program() -> String {
    ".venv/bin/python".to_string()
}

fn default_fallback_program() -> Option<String> {
    Some("python3".to_string())
}

fn default_args() -> Vec<String> {
    vec!["run_task.py".to_string()]
}

fn default_credential_prefix() -> String {
    DEFAULT_CREDENTIAL_PREFIX.to_string()
}

/// Validated configuration. Construct through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub server: ServerConfig,
    pub runner: CommandTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub cors_origins: Vec<HeaderValue>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(server: ServerConfig, runner: CommandTemplate) -> Self {
        Self { server, runner }
    }
}
