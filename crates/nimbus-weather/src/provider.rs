use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use nimbus_core::{Config, Unit, UpstreamConfig};
use reqwest::Client;
use serde::Deserialize;

use crate::slicing::HourlyField;
use crate::types::{AirQuality, Alert, Coordinates, ForecastBundle, WeatherError};

const USER_AGENT: &str = concat!("nimbus/", env!("CARGO_PKG_VERSION"));

const CURRENT_FIELDS: &str = "is_day,temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,weather_code,wind_speed_10m";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,precipitation_probability_max,weather_code,sunrise,sunset";
const DETAIL_DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,precipitation_probability_max,sunrise,sunset";
const AIR_FIELDS: &str = "us_aqi,pm2_5,pm10,european_aqi";
const DETAIL_DAYS: u32 = 7;

/// Client for every upstream the dashboard talks to.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    pub(crate) client: Arc<Client>,
    pub(crate) upstream: UpstreamConfig,
}

impl WeatherProvider {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(upstream: UpstreamConfig, timeout: Option<Duration>) -> Result<Self, WeatherError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client: Arc::new(client),
            upstream,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let timeout = match config.server.upstream_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self::new(config.upstream.clone(), timeout)
    }

    pub fn upstream(&self) -> &UpstreamConfig {
        &self.upstream
    }

    /// Send a GET and return the body text, or `Upstream` for a non-2xx status.
    pub(crate) async fn get_text(
        &self,
        base: &str,
        params: &[(&str, String)],
    ) -> Result<String, WeatherError> {
        let request = self.client.get(base).query(params).build()?;
        let url = request.url().to_string();
        tracing::debug!("GET {}", url);

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("Upstream returned {} for {}", status, url);
            return Err(WeatherError::Upstream {
                status: status.as_u16(),
                url,
                body,
            });
        }
        Ok(body)
    }

    pub(crate) async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        base: &str,
        params: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let body = self.get_text(base, params).await?;
        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))
    }

    fn forecast_params(
        coords: Coordinates,
        unit: Unit,
        start: NaiveDate,
        days: u32,
    ) -> Vec<(&'static str, String)> {
        let end = start
            .checked_add_days(Days::new(u64::from(days.max(1) - 1)))
            .unwrap_or(start);
        let hourly = HourlyField::SUMMARY.map(HourlyField::key).join(",");

        let mut params = vec![
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("hourly", hourly),
            ("timezone", "auto".to_string()),
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ];
        params.extend(unit.upstream_params().map(|(k, v)| (k, v.to_string())));
        params
    }

    /// Raw forecast JSON for `days` days starting at `start`.
    ///
    /// The body is returned untouched so the proxy can pass it through.
    pub async fn forecast_raw(
        &self,
        coords: Coordinates,
        unit: Unit,
        start: NaiveDate,
        days: u32,
    ) -> Result<String, WeatherError> {
        let params = Self::forecast_params(coords, unit, start, days);
        self.get_text(&self.upstream.forecast_url, &params).await
    }

    pub async fn forecast(
        &self,
        coords: Coordinates,
        unit: Unit,
        start: NaiveDate,
        days: u32,
    ) -> Result<ForecastBundle, WeatherError> {
        let body = self.forecast_raw(coords, unit, start, days).await?;
        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))
    }

    /// Week of detailed hourly data for the day view.
    pub async fn day_detail(
        &self,
        coords: Coordinates,
        unit: Unit,
        timezone: Option<&str>,
    ) -> Result<ForecastBundle, WeatherError> {
        let hourly = HourlyField::DETAIL.map(HourlyField::key).join(",");
        let mut params = vec![
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            (
                "timezone",
                timezone.filter(|tz| !tz.is_empty()).unwrap_or("auto").to_string(),
            ),
            ("hourly", hourly),
            ("daily", DETAIL_DAILY_FIELDS.to_string()),
            ("forecast_days", DETAIL_DAYS.to_string()),
        ];
        params.extend(unit.upstream_params().map(|(k, v)| (k, v.to_string())));

        self.get_json(&self.upstream.forecast_url, &params).await
    }

    /// Current air quality. Reads the first hourly entry of each pollutant.
    pub async fn air_quality(&self, coords: Coordinates) -> Result<AirQuality, WeatherError> {
        #[derive(Deserialize, Default)]
        struct AirHourly {
            #[serde(default)]
            us_aqi: Vec<Option<f64>>,
            #[serde(default)]
            pm2_5: Vec<Option<f64>>,
            #[serde(default)]
            pm10: Vec<Option<f64>>,
        }

        #[derive(Deserialize)]
        struct AirResponse {
            #[serde(default)]
            hourly: Option<AirHourly>,
        }

        let params = [
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("hourly", AIR_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
        ];
        let response: AirResponse = self.get_json(&self.upstream.air_quality_url, &params).await?;
        let hourly = response.hourly.unwrap_or_default();
        let first = |v: &[Option<f64>]| v.first().copied().flatten();

        Ok(AirQuality {
            aqi: first(&hourly.us_aqi),
            pm25: first(&hourly.pm2_5),
            pm10: first(&hourly.pm10),
        })
    }

    /// Active weather warnings, normalized.
    pub async fn alerts(&self, coords: Coordinates, lang: &str) -> Result<Vec<Alert>, WeatherError> {
        #[derive(Deserialize)]
        struct WarningsResponse {
            #[serde(default)]
            warnings: Vec<RawWarning>,
        }

        let params = [
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("language", lang.to_string()),
        ];
        let response: WarningsResponse = self.get_json(&self.upstream.warnings_url, &params).await?;
        Ok(response.warnings.into_iter().map(RawWarning::normalize).collect())
    }
}

/// Loosely-typed upstream warning
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawWarning {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

impl RawWarning {
    pub(crate) fn normalize(self) -> Alert {
        let id = match self.id {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Null) | None => format!(
                "{}-{}-{}",
                self.event.as_deref().unwrap_or("undefined"),
                self.severity.as_deref().unwrap_or("undefined"),
                self.start.as_deref().unwrap_or("undefined"),
            ),
            Some(other) => other.to_string(),
        };
        let headline = self
            .headline
            .filter(|h| !h.is_empty())
            .or_else(|| self.event.clone());

        Alert {
            id,
            event: self.event,
            severity: self.severity,
            start: self.start,
            end: self.end,
            headline,
            description: self.description.unwrap_or_default(),
            sender: self.sender.unwrap_or_default(),
            uri: self.uri,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn forecast_params_cover_window_and_units() {
        let coords = Coordinates::new(40.0, -75.0).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 12, 28).unwrap();
        let params = WeatherProvider::forecast_params(coords, Unit::Metric, start, 7);
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("start_date"), Some("2024-12-28"));
        assert_eq!(get("end_date"), Some("2025-01-03"));
        assert_eq!(get("temperature_unit"), Some("celsius"));
        assert_eq!(get("wind_speed_unit"), Some("kmh"));
        assert_eq!(get("precipitation_unit"), Some("mm"));
        assert_eq!(
            get("hourly"),
            Some("temperature_2m,apparent_temperature,wind_speed_10m,precipitation")
        );
        assert_eq!(get("timezone"), Some("auto"));
        assert_eq!(get("past_days"), None);
    }

    #[test]
    fn warning_defaults() {
        let raw: RawWarning = serde_json::from_str(
            r#"{"event":"Flood Watch","severity":"Moderate","start":"2024-01-01T00:00"}"#,
        )
        .unwrap();
        let alert = raw.normalize();
        assert_eq!(alert.id, "Flood Watch-Moderate-2024-01-01T00:00");
        assert_eq!(alert.headline.as_deref(), Some("Flood Watch"));
        assert_eq!(alert.description, "");
        assert_eq!(alert.sender, "");
        assert_eq!(alert.uri, None);
    }

    #[test]
    fn warning_keeps_upstream_values() {
        let raw: RawWarning = serde_json::from_str(
            r#"{"id":"w1","event":"Heat","headline":"Heat Advisory","sender":"NWS","uri":"https://x"}"#,
        )
        .unwrap();
        let alert = raw.normalize();
        assert_eq!(alert.id, "w1");
        assert_eq!(alert.headline.as_deref(), Some("Heat Advisory"));
        assert_eq!(alert.sender, "NWS");
        assert_eq!(alert.uri.as_deref(), Some("https://x"));
    }
}
