//! Application state for the proxy routes.

use std::sync::Arc;

use nimbus_core::Config;
use nimbus_weather::{WeatherError, WeatherProvider};

/// Shared application state.
pub struct AppState {
    /// Upstream client, shared connection pool.
    pub provider: WeatherProvider,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Result<Self, WeatherError> {
        let provider = WeatherProvider::from_config(&config)?;
        Ok(Self { provider, config })
    }

    pub fn with_provider(provider: WeatherProvider, config: Arc<Config>) -> Self {
        Self { provider, config }
    }
}
