// tests/config_loading.rs

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use agentrun::cli::{CliArgs, LogLevel};
use agentrun::config::{ConfigFile, RawConfigFile, load_and_validate, load_from_path};
use agentrun::errors::AgentrunError;
use agentrun::load_config;
use agentrun::logging::resolve_level;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("agentrun.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn empty_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let raw = load_from_path(&path).unwrap();
    assert_eq!(raw.server.bind, "127.0.0.1:8000");
    assert_eq!(
        raw.server.cors_origins,
        vec!["http://localhost:5173".to_string(), "http://127.0.0.1:5173".to_string()]
    );
    assert_eq!(raw.runner.program, ".venv/bin/python");
    assert_eq!(raw.runner.fallback_program.as_deref(), Some("python3"));
    assert_eq!(raw.runner.args, vec!["run_task.py".to_string()]);
    assert_eq!(raw.runner.credential_prefix, "CRED_");
    assert!(raw.runner.working_dir.is_none());
    assert!(raw.runner.env.is_empty());
}

#[test]
fn full_file_is_validated_into_template() {
    let dir = TempDir::new().unwrap();
    let work = dir.path().join("agent");
    fs::create_dir(&work).unwrap();
    let path = write_config(
        &dir,
        &format!(
            r#"
[server]
bind = "0.0.0.0:9100"

[runner]
program = "bin/agent"
fallback_program = "agent"
args = ["--headless"]
working_dir = "{}"
credential_prefix = "SECRET_"

[runner.env]
PYTHONUNBUFFERED = "1"
"#,
            work.display()
        ),
    );

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.server.bind, "0.0.0.0:9100".parse::<SocketAddr>().unwrap());
    assert_eq!(cfg.runner.program, "bin/agent");
    assert_eq!(cfg.runner.args, vec!["--headless".to_string()]);
    assert_eq!(cfg.runner.working_dir, work);
    assert_eq!(cfg.runner.credential_prefix, "SECRET_");
    assert_eq!(
        cfg.runner.env.get("PYTHONUNBUFFERED").map(String::as_str),
        Some("1")
    );
    // bin/agent does not exist inside the working dir.
    assert_eq!(cfg.runner.resolve_program(), PathBuf::from("agent"));
}

#[test]
fn local_program_wins_over_fallback() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".venv/bin")).unwrap();
    fs::write(dir.path().join(".venv/bin/python"), "").unwrap();

    let mut raw = RawConfigFile::default();
    raw.runner.working_dir = Some(dir.path().to_path_buf());
    let cfg = ConfigFile::try_from(raw).unwrap();

    assert_eq!(cfg.runner.resolve_program(), dir.path().join(".venv/bin/python"));
}

#[test]
fn empty_fallback_disables_it() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        &format!(
            "[runner]\nprogram = \"agent\"\nfallback_program = \"\"\nworking_dir = \"{}\"\n",
            dir.path().display()
        ),
    );

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.runner.fallback_program, None);
    assert_eq!(cfg.runner.resolve_program(), PathBuf::from("agent"));
}

#[test]
fn invalid_bind_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server]\nbind = \"localhost\"\n");

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, AgentrunError::ConfigError(_)), "got {err:?}");
}

#[test]
fn cors_origins_are_validated() {
    let dir = TempDir::new().unwrap();

    let path = write_config(&dir, "[server]\ncors_origins = [\"https://app.example\"]\n");
    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.server.cors_origins.len(), 1);
    assert_eq!(cfg.server.cors_origins[0], "https://app.example");

    let path = write_config(&dir, "[server]\ncors_origins = []\n");
    assert!(load_and_validate(&path).unwrap().server.cors_origins.is_empty());

    let path = write_config(&dir, "[server]\ncors_origins = [\"localhost:5173\"]\n");
    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, AgentrunError::ConfigError(_)), "got {err:?}");
}

#[test]
fn empty_program_is_rejected() {
    let mut raw = RawConfigFile::default();
    raw.runner.program = "  ".to_string();

    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("program"), "got {err}");
}

#[test]
fn bad_credential_prefix_is_rejected() {
    for prefix in ["", "A=B"] {
        let mut raw = RawConfigFile::default();
        raw.runner.credential_prefix = prefix.to_string();
        assert!(
            matches!(ConfigFile::try_from(raw), Err(AgentrunError::ConfigError(_))),
            "prefix {prefix:?} should be rejected"
        );
    }
}

#[test]
fn malformed_toml_is_toml_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server\nbind = 1");

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, AgentrunError::TomlError(_)), "got {err:?}");
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, AgentrunError::IoError(_)), "got {err:?}");
}

#[test]
fn cli_overrides_apply_on_top_of_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server]\nbind = \"127.0.0.1:8000\"\n");

    let args = CliArgs {
        config: Some(path),
        bind: Some("127.0.0.1:9999".to_string()),
        working_dir: Some(dir.path().to_path_buf()),
        ..CliArgs::default()
    };
    let cfg = load_config(&args).unwrap();

    assert_eq!(cfg.server.bind.port(), 9999);
    assert_eq!(cfg.runner.working_dir, dir.path());
}

#[test]
fn no_config_path_uses_defaults() {
    let cfg = load_config(&CliArgs::default()).unwrap();
    assert_eq!(cfg.server.bind, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
    assert_eq!(cfg.runner.args, vec!["run_task.py".to_string()]);
}

#[test]
fn log_level_priority() {
    use tracing::Level;

    assert_eq!(resolve_level(Some(LogLevel::Trace), Some("error")), Level::TRACE);
    assert_eq!(resolve_level(None, Some(" Debug ")), Level::DEBUG);
    assert_eq!(resolve_level(None, Some("warning")), Level::WARN);
    assert_eq!(resolve_level(None, Some("nonsense")), Level::INFO);
    assert_eq!(resolve_level(None, None), Level::INFO);
}
