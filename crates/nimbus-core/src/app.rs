use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::store::{FileBackend, PreferenceStore, SharedStore, StateBackend};
use crate::Config;

/// Application state and lifecycle manager.
///
/// Owns the configuration and the preference store; the store is read once
/// here and written back on shutdown.
pub struct App {
    config: Arc<Config>,
    store: SharedStore,
}

impl App {
    /// Create an application backed by the state file in the config directory
    pub fn new(config: Config) -> Self {
        let backend = FileBackend::new(config.state_path());
        Self::with_backend(config, Box::new(backend))
    }

    pub fn with_backend(config: Config, backend: Box<dyn StateBackend>) -> Self {
        tracing::info!("Loading preferences");
        let store = PreferenceStore::load(backend, config.ui.recent_limit);
        Self {
            config: Arc::new(config),
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Flush preferences. Storage failures are logged, not fatal.
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");

        if let Err(e) = self.store.lock().flush() {
            tracing::error!("Error saving preferences: {}", e);
        }

        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::store::MemoryBackend;
    use crate::Unit;

    #[test]
    fn shutdown_flushes_store() {
        let backend = MemoryBackend::default();
        let mut app = App::with_backend(Config::default(), Box::new(backend.clone()));
        app.store().lock().set_unit(Unit::Metric);
        app.shutdown().unwrap();
        assert!(backend.contents().unwrap().contains("metric"));
    }

    #[test]
    fn startup_reads_existing_state() {
        let backend = MemoryBackend::with_contents(r#"{"recentCities":["Oslo"]}"#);
        let app = App::with_backend(Config::default(), Box::new(backend));
        assert_eq!(app.store().lock().recent_cities(), ["Oslo"]);
    }
}
