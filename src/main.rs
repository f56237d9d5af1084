//! Nimbus server
//!
//! Serves the weather proxy routes over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nimbus_api::AppState;
use nimbus_core::{App, Config};

#[derive(Parser, Debug)]
#[command(name = "nimbus")]
#[command(about = "Weather dashboard proxy server")]
struct Args {
    /// Listen address, overrides the config file
    #[arg(short, long, env = "NIMBUS_LISTEN_ADDR")]
    listen: Option<String>,

    /// Path to config.toml
    #[arg(short, long, env = "NIMBUS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, overrides the config file
    #[arg(long, env = "NIMBUS_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let (mut config, validation) = Config::load_validated(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    let log_level = args
        .log_level
        .unwrap_or_else(|| config.server.log_level.clone());

    nimbus_core::init(&log_level)?;
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }

    let listen_addr = config.server.listen_addr.clone();
    let mut app = App::new(config);

    let state = AppState::new(app.shared_config()).context("Failed to build upstream client")?;
    let router = nimbus_api::router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;
    tracing::info!("Nimbus listening on {}", listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    app.shutdown()?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
