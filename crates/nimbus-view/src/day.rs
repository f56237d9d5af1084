//! Single-day detail view.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use nimbus_core::{Unit, UnitLabels};
use nimbus_weather::slicing::{
    format_value, index_at_hour, local_date, local_hour, slice_series, slice_times, summarize,
    total, DayRange, Summary,
};
use nimbus_weather::{ForecastBundle, HourlyField};

#[derive(Debug, Clone, PartialEq)]
pub struct HourRow {
    pub time: String,
    pub temperature: String,
    pub feels_like: String,
    pub wind: String,
    pub gust: String,
    pub precipitation: String,
    /// Percent, clamped to 0..=100
    pub chance: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayView {
    pub date: String,
    pub title: String,
    pub range: DayRange,
    pub temperature: Summary,
    pub feels_like: Summary,
    pub wind: Summary,
    pub gusts: Summary,
    pub precip_total: String,
    pub precip_chance: Summary,
    pub humidity: Summary,
    pub cloud_cover: Summary,
    pub uv_index: Summary,
    pub hours: Vec<HourRow>,
    /// Row to highlight: the current hour today, midday otherwise
    pub selected: Option<usize>,
    pub labels: UnitLabels,
}

impl DayView {
    pub fn build(bundle: &ForecastBundle, date: &str, unit: Unit, now: DateTime<Utc>) -> Self {
        let hourly = &bundle.hourly;
        let range = hourly.day_range(date);
        let series = |field| slice_series(hourly, range, field);
        let labels = unit.labels();
        let decimals = unit.precip_decimals();

        let is_today = local_date(now, &bundle.timezone).format("%Y-%m-%d").to_string() == date;
        let selected = index_at_hour(range, local_hour(now, &bundle.timezone), is_today)
            .map(|i| i - range.start);

        let precip_total = match total(series(HourlyField::Precipitation)) {
            Some(sum) => format!("{} {}", format_value(Some(sum), decimals), labels.precip),
            None => format_value(None, decimals),
        };

        let hours = hour_rows(bundle, range, unit);

        Self {
            date: date.to_string(),
            title: date_title(date),
            range,
            temperature: summarize(series(HourlyField::Temperature)),
            feels_like: summarize(series(HourlyField::ApparentTemperature)),
            wind: summarize(series(HourlyField::WindSpeed)),
            gusts: summarize(series(HourlyField::WindGusts)),
            precip_total,
            precip_chance: summarize(series(HourlyField::PrecipitationProbability)),
            humidity: summarize(series(HourlyField::Humidity)),
            cloud_cover: summarize(series(HourlyField::CloudCover)),
            uv_index: summarize(series(HourlyField::UvIndex)),
            hours,
            selected,
            labels,
        }
    }

    pub fn has_data(&self) -> bool {
        !self.range.is_empty()
    }
}

fn hour_rows(bundle: &ForecastBundle, range: DayRange, unit: Unit) -> Vec<HourRow> {
    let hourly = &bundle.hourly;
    let labels = unit.labels();
    let at = |field, i: usize| slice_series(hourly, range, field).get(i).copied();
    let or_zero = |v: Option<f64>| v.filter(|v| v.is_finite()).unwrap_or(0.0);

    slice_times(hourly, range)
        .iter()
        .enumerate()
        .map(|(i, t)| HourRow {
            time: hour_label(t),
            temperature: format!(
                "{}{}",
                format_value(at(HourlyField::Temperature, i), 0),
                labels.temp
            ),
            feels_like: format!(
                "{}{}",
                format_value(at(HourlyField::ApparentTemperature, i), 0),
                labels.temp
            ),
            wind: format!(
                "{} {}",
                format_value(Some(or_zero(at(HourlyField::WindSpeed, i))), 0),
                labels.wind
            ),
            gust: format!(
                "{} {}",
                format_value(Some(or_zero(at(HourlyField::WindGusts, i))), 0),
                labels.wind
            ),
            precipitation: format!(
                "{} {}",
                format_value(
                    Some(or_zero(at(HourlyField::Precipitation, i))),
                    unit.precip_decimals()
                ),
                labels.precip
            ),
            chance: or_zero(at(HourlyField::PrecipitationProbability, i))
                .round()
                .clamp(0.0, 100.0) as u8,
        })
        .collect()
}

/// "3 PM" for an upstream local timestamp
pub fn hour_label(timestamp: &str) -> String {
    match NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M") {
        Ok(t) => t.format("%-I %p").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// "Monday, January 1"; the raw key when it is not a date.
pub fn date_title(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%A, %B %-d").to_string(),
        Err(_) => date.to_string(),
    }
}
