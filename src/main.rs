//! Weekly ToC Digest — Binary Entrypoint
//! Loads the environment, initializes tracing, and runs one digest pass.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use toc_digest::config::Config;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::from_env()?;
    toc_digest::engine::run(&cfg).await
}
