use anyhow::{Context, Result};
use price_updater_bot::Application;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging().context("initializing logging")?;

    let app = Application::init()?;
    app.run().await
}

fn init_logging() -> Result<()> {
    // use RUST_LOG if provided; otherwise default
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,price_updater_bot=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))
}
