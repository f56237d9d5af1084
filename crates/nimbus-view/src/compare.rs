//! Side-by-side comparison of saved places for one date.

use nimbus_core::{SavedPlace, Unit};
use nimbus_weather::slicing::{format_value, slice_series, summarize, total, Summary};
use nimbus_weather::{ForecastBundle, HourlyField};

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub name: String,
    pub temperature: Summary,
    pub precip_total: Option<f64>,
    pub wind_max: Option<f64>,
}

impl ComparisonRow {
    pub fn precip_text(&self, unit: Unit) -> String {
        format_value(self.precip_total, unit.precip_decimals())
    }

    pub fn wind_text(&self) -> String {
        format_value(self.wind_max, 0)
    }

    pub fn has_data(&self) -> bool {
        !self.temperature.is_no_data()
    }
}

/// One row per place, in input order. Places without a bundle, or without
/// hours on `date`, get the no-data sentinel.
pub fn compare(places: &[(SavedPlace, Option<ForecastBundle>)], date: &str) -> Vec<ComparisonRow> {
    places
        .iter()
        .map(|(place, bundle)| match bundle {
            Some(bundle) => {
                let range = bundle.hourly.day_range(date);
                let series = |field| slice_series(&bundle.hourly, range, field);
                ComparisonRow {
                    name: place.name.clone(),
                    temperature: summarize(series(HourlyField::Temperature)),
                    precip_total: total(series(HourlyField::Precipitation)),
                    wind_max: summarize(series(HourlyField::WindSpeed)).max(),
                }
            }
            None => ComparisonRow {
                name: place.name.clone(),
                temperature: Summary::NoData,
                precip_total: None,
                wind_max: None,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn place(name: &str) -> SavedPlace {
        SavedPlace {
            name: name.into(),
            latitude: 0.0,
            longitude: 0.0,
            timezone: None,
        }
    }

    fn bundle() -> ForecastBundle {
        serde_json::from_value(serde_json::json!({
            "timezone": "UTC",
            "hourly": {
                "time": ["2024-01-01T00:00", "2024-01-01T01:00", "2024-01-02T00:00"],
                "temperature_2m": [10.0, 12.0, 5.0],
                "precipitation": [0.5, 0.25, 1.0],
                "wind_speed_10m": [3.0, 9.0, 20.0]
            }
        }))
        .unwrap()
    }

    #[test]
    fn rows_follow_input_order() {
        let rows = compare(
            &[(place("A"), Some(bundle())), (place("B"), None)],
            "2024-01-01",
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "A");
        assert_eq!(rows[0].temperature.avg(), Some(11.0));
        assert_eq!(rows[0].precip_total, Some(0.75));
        assert_eq!(rows[0].wind_max, Some(9.0));
        assert_eq!(rows[0].precip_text(Unit::Us), "0.75");
        assert!(!rows[1].has_data());
        assert_eq!(rows[1].wind_text(), "--");
    }

    #[test]
    fn date_outside_forecast_is_no_data() {
        let rows = compare(&[(place("A"), Some(bundle()))], "2025-06-01");
        assert_eq!(rows[0].temperature, Summary::NoData);
        assert_eq!(rows[0].precip_total, None);
        assert_eq!(rows[0].wind_max, None);
    }
}
