// src/config/validate.rs

use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::config::model::{ConfigFile, RawConfigFile, RunnerSection, ServerConfig};
use crate::errors::{AgentrunError, Result};
use crate::exec::CommandTemplate;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AgentrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let server = ServerConfig {
            bind: parse_bind(&raw.server.bind)?,
            cors_origins: parse_origins(&raw.server.cors_origins)?,
        };
        validate_runner(&raw.runner)?;
        let runner = build_template(raw.runner)?;
        Ok(ConfigFile::new_unchecked(server, runner))
    }
}

fn parse_bind(bind: &str) -> Result<SocketAddr> {
    bind.trim().parse().map_err(|e| {
        AgentrunError::ConfigError(format!("[server].bind '{bind}' is not a socket address: {e}"))
    })
}

fn parse_origins(origins: &[String]) -> Result<Vec<HeaderValue>> {
    origins
        .iter()
        .map(|origin| {
            let origin = origin.trim();
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                return Err(AgentrunError::ConfigError(format!(
                    "[server].cors_origins entry '{origin}' must start with http:// or https://"
                )));
            }
            HeaderValue::from_str(origin).map_err(|e| {
                AgentrunError::ConfigError(format!(
                    "[server].cors_origins entry '{origin}' is not a valid origin: {e}"
                ))
            })
        })
        .collect()
}

fn validate_runner(runner: &RunnerSection) -> Result<()> {
    if runner.program.trim().is_empty() {
        return Err(AgentrunError::ConfigError(
            "[runner].program must not be empty".to_string(),
        ));
    }

    validate_env_key("[runner].credential_prefix", &runner.credential_prefix)?;

    for key in runner.env.keys() {
        validate_env_key("[runner.env] key", key)?;
    }

    Ok(())
}

fn validate_env_key(what: &str, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(AgentrunError::ConfigError(format!(
            "{what} must not be empty"
        )));
    }
    if key.contains(['=', '\0']) {
        return Err(AgentrunError::ConfigError(format!(
            "{what} '{key}' must not contain '=' or NUL"
        )));
    }
    Ok(())
}

fn build_template(runner: RunnerSection) -> Result<CommandTemplate> {
    let working_dir = match runner.working_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let mut template = CommandTemplate::new(runner.program, working_dir)
        .with_args(runner.args)
        .with_credential_prefix(runner.credential_prefix);

    // `fallback_program = ""` switches the fallback off.
    if let Some(fallback) = runner.fallback_program.filter(|p| !p.trim().is_empty()) {
        template = template.with_fallback(fallback);
    }
    for (key, value) in runner.env {
        template = template.with_env(key, value);
    }

    Ok(template)
}
