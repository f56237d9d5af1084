//! Error types shared by the dashboard layers.
//!
//! Each enum carries a `user_message()` with text safe to show in the UI; the
//! `Display` form keeps the detail for logs.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error seen by dashboard code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Other(_) => "Something went wrong. Please try again.",
        }
    }
}

/// Transport-level failures talking to the proxy or an upstream.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "Unable to reach the weather service.",
            NetworkError::Timeout => "The weather service took too long to respond.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Please try again later."
            }
            NetworkError::ServerError { .. } | NetworkError::InvalidResponse(_) => {
                "Failed to load weather data. Please try again."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Parse { .. } => "The config file is malformed.",
            ConfigError::Invalid(_) => "The configuration has invalid values.",
        }
    }
}

/// Weather data failures as the dashboard reports them.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Invalid coordinates: {lat}, {lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    /// A geocode search that matched nothing
    #[error("Could not find \u{201c}{0}\u{201d}. Try adding state/country.")]
    PlaceNotFound(String),

    #[error("Upstream returned {status}: {detail}")]
    Upstream { status: u16, detail: String },

    #[error("Malformed weather data: {0}")]
    Malformed(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::InvalidCoordinates { .. } => "That location is out of range.",
            WeatherError::PlaceNotFound(_) => "No matching place. Try adding state/country.",
            WeatherError::Upstream { .. } | WeatherError::Malformed(_) => {
                "Failed to load weather data. Please try again."
            }
        }
    }
}

/// Preference store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read state: {0}")]
    Read(String),

    #[error("Failed to write state: {0}")]
    Write(String),

    #[error("Failed to encode state: {0}")]
    Encode(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Read(_) => "Saved preferences could not be loaded.",
            StorageError::Write(_) | StorageError::Encode(_) => "Preferences could not be saved.",
        }
    }
}

/// Classifies reqwest failures into [`NetworkError`].
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_split_on_status() {
        let down = NetworkError::ServerError {
            status: 503,
            message: "down".into(),
        };
        let bad = NetworkError::ServerError {
            status: 404,
            message: "missing".into(),
        };
        assert_ne!(down.user_message(), bad.user_message());
        assert_eq!(bad.user_message(), "Failed to load weather data. Please try again.");
    }

    #[test]
    fn test_place_not_found_names_the_query() {
        let err = WeatherError::PlaceNotFound("Atlantis".into());
        assert_eq!(
            err.to_string(),
            "Could not find \u{201c}Atlantis\u{201d}. Try adding state/country."
        );
    }

    #[test]
    fn test_app_error_delegates_user_message() {
        let err: AppError = WeatherError::Upstream {
            status: 502,
            detail: "bad gateway".into(),
        }
        .into();
        assert_eq!(err.user_message(), "Failed to load weather data. Please try again.");

        let err: AppError = ConfigError::Parse {
            path: PathBuf::from("config.toml"),
            message: "expected `=`".into(),
        }
        .into();
        assert_eq!(err.user_message(), "The config file is malformed.");
    }
}
