//! IP-based location, used when device location is unavailable.

use crate::provider::WeatherProvider;
use crate::types::{IpLocation, WeatherError};

impl WeatherProvider {
    /// Approximate location of the caller's public IP.
    pub async fn ip_lookup(&self) -> Result<IpLocation, WeatherError> {
        self.get_json(&self.upstream.ip_lookup_url, &[]).await
    }

    /// Display name from the IP lookup. Failures are absorbed and logged.
    pub async fn ip_name(&self) -> Option<String> {
        match self.ip_lookup().await {
            Ok(loc) => loc.display_name(),
            Err(e) => {
                tracing::debug!("IP lookup failed: {}", e);
                None
            }
        }
    }
}
