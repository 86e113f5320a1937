// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod event;
pub mod exec;
pub mod http;
pub mod logging;
pub mod types;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, load_from_path};
use crate::engine::RunCoordinator;
use crate::exec::CommandLauncher;
use crate::http::HttpApi;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + CLI overrides
/// - the run coordinator and its process launcher
/// - the HTTP router
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(&args)?;

    if args.print_config {
        print_config(&cfg);
        return Ok(());
    }

    let coordinator = RunCoordinator::new(CommandLauncher, cfg.runner.clone());
    let app = HttpApi::new(coordinator)
        .with_cors_origins(cfg.server.cors_origins.clone())
        .router();

    let listener = TcpListener::bind(cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    info!(
        addr = %listener.local_addr()?,
        working_dir = %cfg.runner.working_dir.display(),
        "agentrun listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("agentrun stopped");
    Ok(())
}

/// Config file (or defaults) plus CLI overrides, validated.
pub fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RawConfigFile::default(),
    };
    args.apply_overrides(&mut raw);
    Ok(ConfigFile::try_from(raw)?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to listen for Ctrl+C: {e}");
        return;
    }
    info!("Ctrl+C received; shutting down");
}

fn print_config(cfg: &ConfigFile) {
    let runner = &cfg.runner;
    println!("agentrun config");
    println!("  server.bind = {}", cfg.server.bind);
    for origin in &cfg.server.cors_origins {
        println!("  server.cors_origin = {}", origin.to_str().unwrap_or("<non-ascii>"));
    }
    println!("  runner.program = {}", runner.program);
    if let Some(fallback) = &runner.fallback_program {
        println!("  runner.fallback_program = {fallback}");
    }
    println!("  runner.resolved_program = {}", runner.resolve_program().display());
    println!("  runner.args = {:?}", runner.args);
    println!("  runner.working_dir = {}", runner.working_dir.display());
    println!("  runner.credential_prefix = {}", runner.credential_prefix);
    for key in runner.env.keys() {
        println!("  runner.env.{key} = <set>");
    }
}
