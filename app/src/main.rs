//! Quoter service entry point
//!
//! Usage: `quoter [config.json]`. Without a path the defaults are used.

use anyhow::Context;

use quoter_api::{start_server, AppState};
use quoter_core::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quoter=debug".parse()?)
                .add_directive("clmm=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => AppConfig::default(),
    };

    tracing::info!(
        "Quoter starting: program {}, protocol {}, fallback {}",
        config.program_id,
        config.protocol_version,
        config.fallback_policy
    );

    let state = AppState::with_config(config).context("Invalid configuration")?;
    start_server(state).await.context("API server stopped")?;

    Ok(())
}
