// src/main.rs

use agentrun::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("agentrun error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    load_dotenv()?;
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}

/// Load `.env` from the current directory into the process environment,
/// which every task process inherits.
fn load_dotenv() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(anyhow::anyhow!("loading .env: {e}")),
    }
}
