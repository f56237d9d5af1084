use serde::{Deserialize, Serialize};

use crate::slicing::HourlyBundle;

/// Validated latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Rejects non-finite values, |lat| > 90 and |lon| > 180.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WeatherError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || latitude.abs() > 90.0
            || longitude.abs() > 180.0
        {
            return Err(WeatherError::InvalidCoordinates {
                lat: latitude,
                lon: longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse raw query strings. `None` when either is missing or not a number.
    pub fn parse(lat: Option<&str>, lon: Option<&str>) -> Option<(f64, f64)> {
        let lat = lat?.trim().parse::<f64>().ok()?;
        let lon = lon?.trim().parse::<f64>().ok()?;
        Some((lat, lon))
    }
}

/// One geocoding match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPlace {
    pub name: String,
    #[serde(default)]
    pub admin1: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl GeoPlace {
    /// "Name, Region, Country" with empty parts dropped
    pub fn display_name(&self) -> String {
        join_place_parts(
            Some(self.name.as_str()),
            self.admin1.as_deref(),
            self.country.as_deref(),
        )
    }

    pub fn coordinates(&self) -> Result<Coordinates, WeatherError> {
        Coordinates::new(self.latitude, self.longitude)
    }
}

pub(crate) fn join_place_parts(
    name: Option<&str>,
    admin1: Option<&str>,
    country: Option<&str>,
) -> String {
    [name, admin1, country]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Air quality reading. Every field is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub aqi: Option<f64>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
}

/// Normalized weather warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub event: Option<String>,
    pub severity: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub headline: Option<String>,
    pub description: String,
    pub sender: String,
    pub uri: Option<String>,
}

/// Result of an IP-based location lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub country_name: Option<String>,
}

impl IpLocation {
    /// "City, Country", or just the city
    pub fn display_name(&self) -> Option<String> {
        let city = self.city.as_deref().filter(|c| !c.is_empty())?;
        match self.country_name.as_deref().filter(|c| !c.is_empty()) {
            Some(country) => Some(format!("{}, {}", city, country)),
            None => Some(city.to_string()),
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.latitude?, self.longitude?).ok()
    }
}

/// `current` block of a forecast response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub is_day: Option<i32>,
    #[serde(default)]
    pub temperature_2m: Option<f64>,
    #[serde(default)]
    pub relative_humidity_2m: Option<f64>,
    #[serde(default)]
    pub apparent_temperature: Option<f64>,
    #[serde(default)]
    pub precipitation: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<i32>,
    #[serde(default)]
    pub wind_speed_10m: Option<f64>,
}

impl CurrentConditions {
    pub fn is_daytime(&self) -> bool {
        self.is_day.unwrap_or(1) != 0
    }
}

/// `daily` block of a forecast response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyBundle {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub sunrise: Vec<String>,
    #[serde(default)]
    pub sunset: Vec<String>,
}

/// Parsed forecast response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBundle {
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub current: Option<CurrentConditions>,
    #[serde(default)]
    pub hourly: HourlyBundle,
    #[serde(default)]
    pub daily: DailyBundle,
}

/// Upstream client errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Upstream returned {status} for {url}")]
    Upstream { status: u16, url: String, body: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid coordinates: {lat}, {lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

impl From<WeatherError> for nimbus_core::AppError {
    fn from(err: WeatherError) -> Self {
        use nimbus_core::{ReqwestErrorExt, WeatherError as CoreWeatherError};
        match err {
            WeatherError::Network(e) => nimbus_core::AppError::Network(e.into_network_error()),
            WeatherError::Upstream { status, body, .. } => {
                CoreWeatherError::Upstream {
                    status,
                    detail: body.chars().take(500).collect(),
                }
                .into()
            }
            WeatherError::Parse(msg) => CoreWeatherError::Malformed(msg).into(),
            WeatherError::InvalidCoordinates { lat, lon } => {
                CoreWeatherError::InvalidCoordinates { lat, lon }.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn coordinates_reject_out_of_range() {
        assert!(Coordinates::new(47.6, -122.3).is_ok());
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(90.1, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn parse_requires_both_numeric() {
        assert_eq!(Coordinates::parse(Some("1.5"), Some(" -2 ")), Some((1.5, -2.0)));
        assert_eq!(Coordinates::parse(None, Some("2")), None);
        assert_eq!(Coordinates::parse(Some("abc"), Some("2")), None);
    }

    #[test]
    fn display_name_skips_empty_parts() {
        let place = GeoPlace {
            name: "Springfield".into(),
            admin1: Some(String::new()),
            country: Some("United States".into()),
            latitude: 39.8,
            longitude: -89.6,
            population: None,
            timezone: None,
        };
        assert_eq!(place.display_name(), "Springfield, United States");
    }

    #[test]
    fn ip_location_name() {
        let mut loc = IpLocation {
            latitude: Some(1.0),
            longitude: Some(2.0),
            city: Some("Lyon".into()),
            country_name: Some("France".into()),
        };
        assert_eq!(loc.display_name().as_deref(), Some("Lyon, France"));
        loc.country_name = None;
        assert_eq!(loc.display_name().as_deref(), Some("Lyon"));
        loc.city = None;
        assert_eq!(loc.display_name(), None);
    }

    #[test]
    fn forecast_bundle_tolerates_missing_blocks() {
        let bundle: ForecastBundle = serde_json::from_str(r#"{"timezone":"UTC"}"#).unwrap();
        assert!(bundle.current.is_none());
        assert!(bundle.hourly.is_empty());
        assert!(bundle.daily.time.is_empty());
    }

    #[test]
    fn upstream_error_maps_to_user_message() {
        let err: nimbus_core::AppError = WeatherError::Upstream {
            status: 502,
            url: "http://x".into(),
            body: "bad".into(),
        }
        .into();
        assert_eq!(err.user_message(), "Failed to load weather data. Please try again.");
    }
}
