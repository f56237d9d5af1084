//! Dashboard data source.
//!
//! [`WeatherSource`] is what the view models fetch through. [`ApiClient`]
//! implements it against the Nimbus proxy routes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nimbus_core::{AppError, NetworkError, ReqwestErrorExt, Unit, WeatherError};
use nimbus_weather::{AirQuality, Alert, Coordinates, ForecastBundle, GeoPlace, IpLocation};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn geocode(&self, query: &str, count: u32) -> Result<Vec<GeoPlace>, AppError>;

    async fn forecast(&self, coords: Coordinates, unit: Unit) -> Result<ForecastBundle, AppError>;

    async fn day_detail(
        &self,
        coords: Coordinates,
        unit: Unit,
        timezone: Option<&str>,
    ) -> Result<ForecastBundle, AppError>;

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<String>, AppError>;

    async fn air(&self, coords: Coordinates) -> Result<AirQuality, AppError>;

    async fn alerts(&self, coords: Coordinates) -> Result<Vec<Alert>, AppError>;

    async fn ip_location(&self) -> Result<IpLocation, AppError>;
}

/// Client for the proxy routes. Day detail and IP lookup go straight to
/// upstream through a [`WeatherProvider`](nimbus_weather::WeatherProvider).
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    client: Arc<Client>,
    provider: nimbus_weather::WeatherProvider,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeoPlace>,
}

#[derive(Deserialize)]
struct NameResponse {
    name: Option<String>,
}

#[derive(Deserialize)]
struct AlertsResponse {
    #[serde(default)]
    alerts: Vec<Alert>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        provider: nimbus_weather::WeatherProvider,
        timeout: Option<Duration>,
    ) -> Result<Self, AppError> {
        // Routes are joined relative to the base, which needs a trailing slash
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&base)
            .map_err(|e| AppError::Config(nimbus_core::ConfigError::Invalid(e.to_string())))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Network(e.into_network_error()))?;

        Ok(Self {
            base_url,
            client: Arc::new(client),
            provider,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        route: &str,
        params: &[(&str, String)],
    ) -> Result<T, AppError> {
        let url = self
            .base_url
            .join(route)
            .map_err(|e| AppError::Other(anyhow::anyhow!("Bad route {}: {}", route, e)))?;

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::Network(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Weather(WeatherError::Upstream {
                status: status.as_u16(),
                detail: detail.chars().take(500).collect(),
            }));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Network(NetworkError::InvalidResponse(e.to_string())))
    }

    fn lat_lon(coords: Coordinates) -> [(&'static str, String); 2] {
        [
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
        ]
    }
}

#[async_trait]
impl WeatherSource for ApiClient {
    async fn geocode(&self, query: &str, count: u32) -> Result<Vec<GeoPlace>, AppError> {
        let params = [("q", query.to_string()), ("count", count.to_string())];
        let response: GeocodeResponse = self.get("geocode", &params).await?;
        Ok(response.results)
    }

    async fn forecast(&self, coords: Coordinates, unit: Unit) -> Result<ForecastBundle, AppError> {
        let [lat, lon] = Self::lat_lon(coords);
        let params = [lat, lon, ("unit", unit.as_str().to_string())];
        self.get("weather", &params).await
    }

    async fn day_detail(
        &self,
        coords: Coordinates,
        unit: Unit,
        timezone: Option<&str>,
    ) -> Result<ForecastBundle, AppError> {
        Ok(self.provider.day_detail(coords, unit, timezone).await?)
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<String>, AppError> {
        let response: NameResponse = self.get("reverse-geocode", &Self::lat_lon(coords)).await?;
        Ok(response.name)
    }

    async fn air(&self, coords: Coordinates) -> Result<AirQuality, AppError> {
        self.get("air", &Self::lat_lon(coords)).await
    }

    async fn alerts(&self, coords: Coordinates) -> Result<Vec<Alert>, AppError> {
        let response: AlertsResponse = self.get("alerts", &Self::lat_lon(coords)).await?;
        Ok(response.alerts)
    }

    async fn ip_location(&self) -> Result<IpLocation, AppError> {
        Ok(self.provider.ip_lookup().await?)
    }
}
