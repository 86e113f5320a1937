//! Shared helpers for agentrun's integration tests: a scripted
//! [`fake_launcher::FakeLauncher`], request/template builders and a couple
//! of runtime utilities.

pub mod builders;
pub mod fake_launcher;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a test subscriber once per test binary.
///
/// Output goes through the harness's capture, so coordinator and launcher
/// logs only show up for failing tests. Filter with `RUST_LOG`, e.g.
/// `RUST_LOG=agentrun::engine=debug` to see every pumped output line.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if a run, stop or HTTP call hangs for more
/// than 5 seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("timed out after 5 seconds waiting on a run")
}
