pub mod app;
pub mod config;
pub mod error;
pub mod generation;
pub mod store;

pub use app::App;
pub use config::{
    Config, RadarConfig, ServerConfig, UiConfig, Unit, UnitLabels, UpstreamConfig, WeatherConfig,
};
pub use error::{AppError, ConfigError, NetworkError, ReqwestErrorExt, StorageError, WeatherError};
pub use generation::{LoadState, RequestTracker, Ticket};
pub use store::{FileBackend, MemoryBackend, PreferenceStore, SavedPlace, SharedStore, StateBackend};

use anyhow::Result;

/// Initialize tracing/logging. `RUST_LOG` overrides `default_level`.
pub fn init(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("Nimbus core initialized");
    Ok(())
}
