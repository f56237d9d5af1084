use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        Self::try_from_wmo_code(code).unwrap_or_default()
    }

    /// `None` for codes outside the WMO table.
    pub fn try_from_wmo_code(code: i32) -> Option<Self> {
        let condition = match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => return None,
        };
        Some(condition)
    }

    pub fn icon(self, is_day: bool) -> &'static str {
        match self {
            Self::Clear if is_day => "☀️",
            Self::Clear => "🌙",
            Self::PartlyCloudy if is_day => "🌤️",
            Self::PartlyCloudy | Self::Cloudy => "☁️",
            Self::Fog => "🌫️",
            Self::Drizzle => "🌦️",
            Self::Rain | Self::HeavyRain | Self::Sleet => "🌧️",
            Self::Snow => "🌨️",
            Self::Thunderstorm => "⛈️",
        }
    }
}

/// Short text for a WMO code, `Code N` when unknown.
pub fn describe(code: i32) -> String {
    let text = match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80 => "Rain showers (slight)",
        81 => "Rain showers (moderate)",
        82 => "Rain showers (violent)",
        85 => "Snow showers (slight)",
        86 => "Snow showers (heavy)",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => return format!("Code {}", code),
    };
    text.to_string()
}

/// Emoji icon for a WMO code, a thermometer when the code is unknown.
pub fn icon(code: i32, is_day: bool) -> &'static str {
    WeatherCondition::try_from_wmo_code(code).map_or("🌡️", |c| c.icon(is_day))
}

/// Background theme for the current conditions card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    ClearDay,
    ClearNight,
    Overcast,
    Fog,
    Rain,
    Snow,
    Thunder,
    Default,
}

impl Theme {
    pub fn from_code(code: Option<i32>, is_day: bool) -> Self {
        let Some(code) = code else {
            return Theme::Default;
        };
        match code {
            0 | 1 if is_day => Theme::ClearDay,
            0 | 1 => Theme::ClearNight,
            2 | 3 => Theme::Overcast,
            45 | 48 => Theme::Fog,
            51..=67 | 80..=82 => Theme::Rain,
            71..=77 | 85 | 86 => Theme::Snow,
            95..=99 => Theme::Thunder,
            _ => Theme::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::ClearDay => "clear-day",
            Theme::ClearNight => "clear-night",
            Theme::Overcast => "overcast",
            Theme::Fog => "fog",
            Theme::Rain => "rain",
            Theme::Snow => "snow",
            Theme::Thunder => "thunder",
            Theme::Default => "default",
        }
    }
}
