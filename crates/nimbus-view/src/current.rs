//! Current conditions card, next-24h series and the five-day list.

use chrono::{Datelike, NaiveDate, Weekday};
use nimbus_core::{Unit, UnitLabels};
use nimbus_weather::slicing::{first_at_or_after, format_value, slice_series, window};
use nimbus_weather::{describe, icon, ForecastBundle, HourlyField, Theme};

const NEXT_HOURS: usize = 24;
const DAY_LIST_LEN: usize = 5;
/// Fewer points than this and a trend line is not worth drawing
const MIN_SERIES_POINTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentCard {
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    pub precipitation: String,
    pub description: String,
    pub icon: &'static str,
    pub theme: Theme,
    pub labels: UnitLabels,
}

/// Series for the next 24 hours. Each is `None` when too short to plot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NextHours {
    pub temperature: Option<Vec<f64>>,
    pub feels_like: Option<Vec<f64>>,
    pub wind: Option<Vec<f64>>,
    pub precipitation: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayRow {
    pub date: String,
    pub label: String,
    pub high: String,
    pub low: String,
    pub precip_chance: Option<f64>,
    pub icon: &'static str,
}

pub fn current_card(bundle: &ForecastBundle, unit: Unit) -> Option<CurrentCard> {
    let current = bundle.current.as_ref()?;
    let is_day = current.is_daytime();
    let code = current.weather_code;

    Some(CurrentCard {
        temperature: format_value(current.temperature_2m, 0),
        feels_like: format_value(current.apparent_temperature, 0),
        humidity: format_value(current.relative_humidity_2m, 0),
        wind: format_value(current.wind_speed_10m, 0),
        precipitation: format_value(current.precipitation.or(Some(0.0)), unit.precip_decimals()),
        description: code.map(describe).unwrap_or_default(),
        icon: code.map_or("🌡️", |c| icon(c, is_day)),
        theme: Theme::from_code(code, is_day),
        labels: unit.labels(),
    })
}

/// Theme for the page background; default when there is no current block.
pub fn theme(bundle: Option<&ForecastBundle>) -> Theme {
    bundle
        .and_then(|b| b.current.as_ref())
        .map_or(Theme::Default, |c| {
            Theme::from_code(c.weather_code, c.is_daytime())
        })
}

pub fn next_hours(bundle: &ForecastBundle) -> NextHours {
    let now = bundle
        .current
        .as_ref()
        .map(|c| c.time.as_str())
        .unwrap_or_default();
    let start = first_at_or_after(bundle.hourly.time(), now);
    let range = window(start, NEXT_HOURS);

    let take = |field| {
        let values = slice_series(&bundle.hourly, range, field);
        (values.len() >= MIN_SERIES_POINTS).then(|| values.to_vec())
    };

    NextHours {
        temperature: take(HourlyField::Temperature),
        feels_like: take(HourlyField::ApparentTemperature),
        wind: take(HourlyField::WindSpeed),
        precipitation: take(HourlyField::Precipitation),
    }
}

/// Up to five days starting at today. The first row is labelled "Today".
pub fn day_list(bundle: &ForecastBundle) -> Vec<DayRow> {
    let daily = &bundle.daily;
    let today = bundle
        .current
        .as_ref()
        .and_then(|c| c.time.get(..10))
        .unwrap_or_default();
    let start = daily
        .time
        .iter()
        .position(|d| d.as_str() >= today)
        .unwrap_or(0);

    daily
        .time
        .iter()
        .enumerate()
        .skip(start)
        .take(DAY_LIST_LEN)
        .enumerate()
        .map(|(row, (i, date))| {
            let at = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
            let code = daily.weather_code.get(i).copied().flatten();
            DayRow {
                date: date.clone(),
                label: if row == 0 {
                    "Today".to_string()
                } else {
                    weekday_label(date)
                },
                high: format_value(at(&daily.temperature_2m_max), 0),
                low: format_value(at(&daily.temperature_2m_min), 0),
                precip_chance: at(&daily.precipitation_probability_max),
                icon: code.map_or("🌡️", |c| icon(c, true)),
            }
        })
        .collect()
}

/// Short weekday for an ISO date, the raw string if it does not parse.
pub fn weekday_label(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => short_weekday(d.weekday()).to_string(),
        Err(_) => date.to_string(),
    }
}

fn short_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn bundle() -> ForecastBundle {
        serde_json::from_value(serde_json::json!({
            "timezone": "UTC",
            "current": {
                "time": "2024-01-01T02:00", "is_day": 0, "temperature_2m": 31.6,
                "apparent_temperature": 25.2, "relative_humidity_2m": 80,
                "wind_speed_10m": 9.4, "weather_code": 0
            },
            "hourly": {
                "time": ["2024-01-01T00:00", "2024-01-01T01:00", "2024-01-01T02:00", "2024-01-01T03:00"],
                "temperature_2m": [30.0, 31.0, 32.0, 33.0],
                "apparent_temperature": [25.0, 26.0, 27.0, 28.0],
                "wind_speed_10m": [5.0, 6.0, 7.0, 8.0],
                "precipitation": [0.0, 0.0, 0.0, null]
            },
            "daily": {
                "time": ["2023-12-31", "2024-01-01", "2024-01-02", "2024-01-03"],
                "temperature_2m_max": [40.0, 41.0, 42.0, 43.0],
                "temperature_2m_min": [20.0, 21.0, null, 23.0],
                "precipitation_probability_max": [0.0, 10.0, 20.0, 30.0],
                "weather_code": [0, 3, 61, 71]
            }
        }))
        .unwrap()
    }

    #[test]
    fn card_formats_current_conditions() {
        let card = current_card(&bundle(), Unit::Us).unwrap();
        assert_eq!(card.temperature, "32");
        assert_eq!(card.feels_like, "25");
        assert_eq!(card.precipitation, "0.00");
        assert_eq!(card.description, "Clear sky");
        assert_eq!(card.icon, "🌙");
        assert_eq!(card.theme, Theme::ClearNight);
        assert_eq!(card.labels.temp, "°F");
    }

    #[test]
    fn next_hours_start_at_current_time() {
        let next = next_hours(&bundle());
        assert_eq!(next.temperature, Some(vec![32.0, 33.0]));
        assert_eq!(next.wind, Some(vec![7.0, 8.0]));
    }

    #[test]
    fn next_hours_hidden_when_too_short() {
        let mut b = bundle();
        if let Some(c) = b.current.as_mut() {
            c.time = "2024-01-01T03:00".into();
        }
        assert_eq!(next_hours(&b), NextHours::default());
    }

    #[test]
    fn day_list_starts_today() {
        let rows = day_list(&bundle());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].label, "Today");
        assert_eq!(rows[0].date, "2024-01-01");
        assert_eq!(rows[1].label, "Tue");
        assert_eq!(rows[1].low, "--");
        assert_eq!(rows[2].icon, "🌨️");
    }

    #[test]
    fn theme_defaults_without_data() {
        assert_eq!(theme(None), Theme::Default);
        assert_eq!(theme(Some(&bundle())), Theme::ClearNight);
    }
}
