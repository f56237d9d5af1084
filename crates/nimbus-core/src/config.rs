use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Measurement system requested by the client.
///
/// `us` is Fahrenheit / mph / inches, `metric` is Celsius / km/h / mm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Us,
    Metric,
}

/// Display suffixes for a [`Unit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitLabels {
    pub temp: &'static str,
    pub wind: &'static str,
    pub precip: &'static str,
}

impl Unit {
    /// Parse a `unit` query value. Anything other than exactly `metric` is `us`.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("metric") => Unit::Metric,
            _ => Unit::Us,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Us => "us",
            Unit::Metric => "metric",
        }
    }

    pub fn labels(self) -> UnitLabels {
        match self {
            Unit::Us => UnitLabels {
                temp: "°F",
                wind: "mph",
                precip: "in",
            },
            Unit::Metric => UnitLabels {
                temp: "°C",
                wind: "km/h",
                precip: "mm",
            },
        }
    }

    /// Upstream query parameters selecting this unit system.
    pub fn upstream_params(self) -> [(&'static str, &'static str); 3] {
        match self {
            Unit::Us => [
                ("temperature_unit", "fahrenheit"),
                ("wind_speed_unit", "mph"),
                ("precipitation_unit", "inch"),
            ],
            Unit::Metric => [
                ("temperature_unit", "celsius"),
                ("wind_speed_unit", "kmh"),
                ("precipitation_unit", "mm"),
            ],
        }
    }

    /// Decimal places used when showing precipitation amounts.
    pub fn precip_decimals(self) -> usize {
        match self {
            Unit::Us => 2,
            Unit::Metric => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    /// Third-party endpoints being proxied
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub weather: WeatherConfig,

    /// Radar playback settings
    #[serde(default)]
    pub radar: RadarConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the proxy routes listen on
    pub listen_addr: String,

    /// Timeout applied to every upstream call, 0 disables it
    pub upstream_timeout_secs: u64,

    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            upstream_timeout_secs: 15,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub forecast_url: String,
    pub geocode_search_url: String,
    pub geocode_reverse_url: String,
    pub air_quality_url: String,
    pub warnings_url: String,
    pub radar_listing_url: String,
    /// Base for radar tiles; the frame path and tile coordinates are appended
    pub radar_tile_base: String,
    pub ip_lookup_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            geocode_search_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            geocode_reverse_url: "https://geocoding-api.open-meteo.com/v1/reverse".to_string(),
            air_quality_url: "https://air-quality-api.open-meteo.com/v1/air-quality".to_string(),
            warnings_url: "https://api.open-meteo.com/v1/warnings".to_string(),
            radar_listing_url: "https://api.rainviewer.com/public/weather-maps.json".to_string(),
            radar_tile_base: "https://tilecache.rainviewer.com".to_string(),
            ip_lookup_url: "https://ipapi.co/json/".to_string(),
        }
    }
}

impl UpstreamConfig {
    /// Point every upstream at a single base URL (used by mock servers in tests).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            forecast_url: format!("{}/v1/forecast", base),
            geocode_search_url: format!("{}/v1/search", base),
            geocode_reverse_url: format!("{}/v1/reverse", base),
            air_quality_url: format!("{}/v1/air-quality", base),
            warnings_url: format!("{}/v1/warnings", base),
            radar_listing_url: format!("{}/public/weather-maps.json", base),
            radar_tile_base: base.to_string(),
            ip_lookup_url: format!("{}/json/", base),
        }
    }

    fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("upstream.forecast_url", &self.forecast_url),
            ("upstream.geocode_search_url", &self.geocode_search_url),
            ("upstream.geocode_reverse_url", &self.geocode_reverse_url),
            ("upstream.air_quality_url", &self.air_quality_url),
            ("upstream.warnings_url", &self.warnings_url),
            ("upstream.radar_listing_url", &self.radar_listing_url),
            ("upstream.radar_tile_base", &self.radar_tile_base),
            ("upstream.ip_lookup_url", &self.ip_lookup_url),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub default_unit: Unit,

    /// Length of the explicit forecast window, today inclusive
    pub forecast_days: u32,

    pub geocode_default_count: u32,
    pub geocode_max_count: u32,
    pub default_lang: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            default_unit: Unit::Us,
            forecast_days: 7,
            geocode_default_count: 10,
            geocode_max_count: 20,
            default_lang: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarConfig {
    /// Playback step in milliseconds
    pub step_ms: u64,

    /// Floor applied to `step_ms`
    pub min_step_ms: u64,

    /// Opacity of the visible frame layer
    pub opacity: f32,

    /// How many past scans to keep from the listing
    pub past_frames: usize,

    pub autoplay: bool,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            step_ms: 800,
            min_step_ms: 200,
            opacity: 0.7,
            past_frames: 6,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Recent cities / places kept in the preference store
    pub recent_limit: usize,

    /// Maximum geocode suggestions shown in the search box
    pub suggestion_limit: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            recent_limit: 5,
            suggestion_limit: 8,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nimbus");

        Self {
            config_dir,
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            weather: WeatherConfig::default(),
            radar: RadarConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults when missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let mut config = Self::default();
            if let Some(parent) = config_path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Errors fail the load; warnings are returned for the caller to report.
    pub fn load_validated(config_path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match config_path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.server.listen_addr.parse::<SocketAddr>().is_err() {
            result.add_error(
                "server.listen_addr",
                format!("Invalid listen address: {}", self.server.listen_addr),
            );
        }

        if self.server.upstream_timeout_secs == 0 {
            result.add_warning(
                "server.upstream_timeout_secs",
                "Upstream timeout disabled; hung requests never resolve",
            );
        }

        for (field, value) in self.upstream.fields() {
            self.validate_url(value, field, &mut result);
        }

        if self.weather.forecast_days == 0 {
            result.add_error("weather.forecast_days", "Forecast window must be at least 1 day");
        } else if self.weather.forecast_days > 16 {
            result.add_warning(
                "weather.forecast_days",
                "Upstream forecasts rarely extend past 16 days",
            );
        }

        if self.weather.geocode_max_count == 0 {
            result.add_error("weather.geocode_max_count", "Must be greater than 0");
        }

        if !(0.0..=1.0).contains(&self.radar.opacity) {
            result.add_error("radar.opacity", "Opacity must be between 0 and 1");
        }

        if self.radar.step_ms < self.radar.min_step_ms {
            result.add_warning(
                "radar.step_ms",
                format!(
                    "Step {}ms is below the {}ms floor and will be raised",
                    self.radar.step_ms, self.radar.min_step_ms
                ),
            );
        }

        if self.ui.recent_limit == 0 {
            result.add_warning("ui.recent_limit", "Recent locations will not be remembered");
        }

        if self.ui.suggestion_limit == 0 {
            result.add_warning("ui.suggestion_limit", "Search suggestions are disabled");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Path of the preference store inside the config directory
    pub fn state_path(&self) -> PathBuf {
        self.config_dir.join("state.json")
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("nimbus");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_upstream_url() {
        let mut config = Config::default();
        config.upstream.forecast_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "upstream.forecast_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.upstream.air_quality_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_invalid_listen_addr() {
        let mut config = Config::default();
        config.server.listen_addr = "localhost".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "server.listen_addr"));
    }

    #[test]
    fn test_radar_opacity_out_of_range() {
        let mut config = Config::default();
        config.radar.opacity = 1.5;
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_step_below_floor_is_warning() {
        let mut config = Config::default();
        config.radar.step_ms = 50;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "radar.step_ms"));
    }

    #[test]
    fn test_unit_from_query() {
        assert_eq!(Unit::from_query(Some("metric")), Unit::Metric);
        assert_eq!(Unit::from_query(Some("us")), Unit::Us);
        assert_eq!(Unit::from_query(Some("Metric")), Unit::Us);
        assert_eq!(Unit::from_query(None), Unit::Us);
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(Unit::Us.labels().temp, "°F");
        assert_eq!(Unit::Metric.labels().wind, "km/h");
        assert_eq!(Unit::Metric.labels().precip, "mm");
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nimbus").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_dir, dir.path().join("nimbus"));

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.radar.step_ms, 800);
        assert_eq!(reloaded.weather.default_unit, Unit::Us);
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/nimbus\"\n[radar]\nstep_ms = 500\nmin_step_ms = 200\nopacity = 0.5\npast_frames = 4\nautoplay = false\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.radar.step_ms, 500);
        assert!(!config.radar.autoplay);
        assert_eq!(config.ui.recent_limit, 5);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[radar\nstep_ms = 500\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::Parse { path: bad, .. }) => assert_eq!(bad, &path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_values_fail_validated_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/nimbus\"\n[radar]\nstep_ms = 800\nmin_step_ms = 200\nopacity = 2.0\npast_frames = 6\nautoplay = true\n",
        )
        .unwrap();

        let err = Config::load_validated(Some(&path)).unwrap_err();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::Invalid(summary)) => assert!(summary.contains("radar.opacity")),
            other => panic!("expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
