//! Day windows and summaries over hourly forecast arrays.
//!
//! Everything here runs on every render, so nothing panics: out-of-range or
//! empty input degrades to an empty window or the [`Summary::NoData`] sentinel.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Hourly variables the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HourlyField {
    Temperature,
    ApparentTemperature,
    Humidity,
    DewPoint,
    Precipitation,
    PrecipitationProbability,
    WeatherCode,
    CloudCover,
    WindSpeed,
    WindGusts,
    Pressure,
    UvIndex,
    Visibility,
}

impl HourlyField {
    /// Upstream variable name
    pub fn key(self) -> &'static str {
        match self {
            Self::Temperature => "temperature_2m",
            Self::ApparentTemperature => "apparent_temperature",
            Self::Humidity => "relative_humidity_2m",
            Self::DewPoint => "dew_point_2m",
            Self::Precipitation => "precipitation",
            Self::PrecipitationProbability => "precipitation_probability",
            Self::WeatherCode => "weather_code",
            Self::CloudCover => "cloud_cover",
            Self::WindSpeed => "wind_speed_10m",
            Self::WindGusts => "wind_gusts_10m",
            Self::Pressure => "pressure_msl",
            Self::UvIndex => "uv_index",
            Self::Visibility => "visibility",
        }
    }

    /// Fields requested by the dashboard's summary fetch
    pub const SUMMARY: [HourlyField; 4] = [
        Self::Temperature,
        Self::ApparentTemperature,
        Self::WindSpeed,
        Self::Precipitation,
    ];

    /// Fields requested by the day-detail fetch
    pub const DETAIL: [HourlyField; 13] = [
        Self::Temperature,
        Self::ApparentTemperature,
        Self::Humidity,
        Self::DewPoint,
        Self::Precipitation,
        Self::PrecipitationProbability,
        Self::WeatherCode,
        Self::CloudCover,
        Self::WindSpeed,
        Self::WindGusts,
        Self::Pressure,
        Self::UvIndex,
        Self::Visibility,
    ];
}

#[derive(Debug, Deserialize)]
struct RawHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(flatten)]
    series: BTreeMap<String, Vec<Option<f64>>>,
}

/// Hourly arrays aligned to one shared `time` array.
///
/// Every series has the same length as `time`; construction fails otherwise.
/// Nulls from upstream are stored as NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHourly")]
pub struct HourlyBundle {
    time: Vec<String>,
    #[serde(flatten)]
    series: BTreeMap<String, Vec<f64>>,
}

/// Error raised when a series does not line up with `time`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("hourly series {field} has {len} entries, expected {expected}")]
pub struct MisalignedSeries {
    pub field: String,
    pub len: usize,
    pub expected: usize,
}

impl TryFrom<RawHourly> for HourlyBundle {
    type Error = MisalignedSeries;

    fn try_from(raw: RawHourly) -> Result<Self, Self::Error> {
        let mut bundle = HourlyBundle::new(raw.time);
        for (field, values) in raw.series {
            let values = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            bundle.insert(field, values)?;
        }
        Ok(bundle)
    }
}

impl HourlyBundle {
    pub fn new(time: Vec<String>) -> Self {
        Self {
            time,
            series: BTreeMap::new(),
        }
    }

    /// Add a series. Rejected if its length differs from `time`.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), MisalignedSeries> {
        let field = field.into();
        if values.len() != self.time.len() {
            return Err(MisalignedSeries {
                field,
                len: values.len(),
                expected: self.time.len(),
            });
        }
        self.series.insert(field, values);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, field: HourlyField, values: Vec<f64>) -> Result<Self, MisalignedSeries> {
        self.insert(field.key(), values)?;
        Ok(self)
    }

    pub fn time(&self) -> &[String] {
        &self.time
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Full series for `field`, empty if upstream did not send it.
    pub fn series(&self, field: HourlyField) -> &[f64] {
        self.series
            .get(field.key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has(&self, field: HourlyField) -> bool {
        self.series.contains_key(field.key())
    }

    pub fn day_range(&self, date_key: &str) -> DayRange {
        day_range(&self.time, date_key)
    }
}

/// Half-open index window `[start, end)` into an hourly bundle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub start: usize,
    pub end: usize,
}

impl DayRange {
    pub const EMPTY: DayRange = DayRange { start: 0, end: 0 };

    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

fn date_part(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}

/// Window of entries whose date portion equals `date_key`.
///
/// Starts at the first match and extends while the date still matches. No
/// match yields [`DayRange::EMPTY`].
pub fn day_range(times: &[String], date_key: &str) -> DayRange {
    let Some(start) = times.iter().position(|t| date_part(t) == date_key) else {
        return DayRange::EMPTY;
    };
    let run = times[start..]
        .iter()
        .take_while(|t| date_part(t) == date_key)
        .count();
    DayRange {
        start,
        end: start + run,
    }
}

/// `field` over `range`. Out-of-bounds ranges are clipped, never a panic.
pub fn slice_series(bundle: &HourlyBundle, range: DayRange, field: HourlyField) -> &[f64] {
    clip(bundle.series(field), range)
}

/// The `time` entries over `range`
pub fn slice_times(bundle: &HourlyBundle, range: DayRange) -> &[String] {
    clip(bundle.time(), range)
}

fn clip<T>(values: &[T], range: DayRange) -> &[T] {
    let end = range.end.min(values.len());
    let start = range.start.min(end);
    &values[start..end]
}

/// Min/max/average of a series, or the no-data sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Summary {
    NoData,
    Values { min: f64, max: f64, avg: f64 },
}

impl Summary {
    pub fn min(self) -> Option<f64> {
        match self {
            Summary::Values { min, .. } => Some(min),
            Summary::NoData => None,
        }
    }

    pub fn max(self) -> Option<f64> {
        match self {
            Summary::Values { max, .. } => Some(max),
            Summary::NoData => None,
        }
    }

    pub fn avg(self) -> Option<f64> {
        match self {
            Summary::Values { avg, .. } => Some(avg),
            Summary::NoData => None,
        }
    }

    pub fn is_no_data(self) -> bool {
        matches!(self, Summary::NoData)
    }
}

/// Placeholder rendered wherever a value is missing
pub const PLACEHOLDER: &str = "--";

/// Round for display, `--` for missing or non-finite values.
pub fn format_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let rounded = format!("{:.*}", decimals, v);
            // Avoid "-0"
            if rounded.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
                rounded.trim_start_matches('-').to_string()
            } else {
                rounded
            }
        }
        _ => PLACEHOLDER.to_string(),
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::NoData => f.write_str(PLACEHOLDER),
            Summary::Values { min, max, avg } => write!(
                f,
                "{} / {} / {}",
                format_value(Some(*min), 0),
                format_value(Some(*max), 0),
                format_value(Some(*avg), 0)
            ),
        }
    }
}

/// Summarize finite values. NaN entries (upstream nulls) are skipped.
pub fn summarize(series: &[f64]) -> Summary {
    let mut count = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &v in series.iter().filter(|v| v.is_finite()) {
        count += 1;
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }
    if count == 0 {
        return Summary::NoData;
    }
    Summary::Values {
        min,
        max,
        avg: sum / count as f64,
    }
}

/// Sum of finite values, `None` when there are none.
pub fn total(series: &[f64]) -> Option<f64> {
    let mut finite = series.iter().copied().filter(|v| v.is_finite()).peekable();
    finite.peek()?;
    Some(finite.sum())
}

/// Hour offset used for days other than today
pub const MIDDAY_OFFSET: usize = 12;

/// Index of the representative hour inside `range`.
///
/// Today maps `hour_of_day` to `start + hour`; other days use midday. Either
/// way the result is clamped into the window. Empty windows give `None`.
pub fn index_at_hour(range: DayRange, hour_of_day: u32, is_today: bool) -> Option<usize> {
    if range.is_empty() {
        return None;
    }
    let offset = if is_today {
        hour_of_day as usize
    } else {
        MIDDAY_OFFSET
    };
    Some((range.start + offset).min(range.end - 1))
}

/// Hour of day at `now` in the bundle's timezone. Unknown zones use UTC.
pub fn local_hour(now: DateTime<Utc>, timezone: &str) -> u32 {
    match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).hour(),
        Err(_) => now.hour(),
    }
}

/// Calendar date at `now` in the given timezone. Unknown zones use UTC.
pub fn local_date(now: DateTime<Utc>, timezone: &str) -> NaiveDate {
    match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).date_naive(),
        Err(_) => now.date_naive(),
    }
}

/// First index whose timestamp is at or after `current`, or 0.
///
/// Timestamps share the upstream ISO layout, so string order is time order.
pub fn first_at_or_after(times: &[String], current: &str) -> usize {
    times
        .iter()
        .position(|t| t.as_str() >= current)
        .unwrap_or(0)
}

/// `len` entries starting at `start`, clipped to the array
pub fn window(start: usize, len: usize) -> DayRange {
    DayRange {
        start,
        end: start.saturating_add(len),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use chrono::TimeZone;

    fn sample() -> HourlyBundle {
        HourlyBundle::new(vec![
            "2024-01-01T00:00".into(),
            "2024-01-01T01:00".into(),
            "2024-01-02T00:00".into(),
        ])
        .with(HourlyField::Temperature, vec![10.0, 12.0, 5.0])
        .unwrap()
    }

    #[test]
    fn day_range_matches_prefix() {
        let bundle = sample();
        assert_eq!(bundle.day_range("2024-01-01"), DayRange { start: 0, end: 2 });
        assert_eq!(bundle.day_range("2024-01-02"), DayRange { start: 2, end: 3 });
    }

    #[test]
    fn worked_example_summary() {
        let bundle = sample();
        let range = bundle.day_range("2024-01-01");
        let summary = summarize(slice_series(&bundle, range, HourlyField::Temperature));
        assert_eq!(
            summary,
            Summary::Values {
                min: 10.0,
                max: 12.0,
                avg: 11.0
            }
        );
    }

    #[test]
    fn missing_date_gives_empty_window_for_every_field() {
        let bundle = sample();
        let range = bundle.day_range("2030-05-05");
        assert_eq!(range, DayRange::EMPTY);
        for field in HourlyField::DETAIL {
            assert!(slice_series(&bundle, range, field).is_empty());
        }
        assert!(slice_times(&bundle, range).is_empty());
    }

    #[test]
    fn slice_clips_out_of_bounds_range() {
        let bundle = sample();
        let s = slice_series(&bundle, DayRange { start: 2, end: 50 }, HourlyField::Temperature);
        assert_eq!(s, &[5.0]);
        let s = slice_series(&bundle, DayRange { start: 9, end: 4 }, HourlyField::Temperature);
        assert!(s.is_empty());
    }

    #[test]
    fn summarize_empty_is_sentinel() {
        assert_eq!(summarize(&[]), Summary::NoData);
        assert_eq!(summarize(&[f64::NAN, f64::NAN]), Summary::NoData);
        assert_eq!(Summary::NoData.to_string(), "--");
        assert_eq!(Summary::NoData.max(), None);
    }

    #[test]
    fn summarize_skips_nulls() {
        let s = summarize(&[f64::NAN, 4.0, 8.0]);
        assert_eq!(s.min(), Some(4.0));
        assert_eq!(s.max(), Some(8.0));
        assert_eq!(s.avg(), Some(6.0));
    }

    #[test]
    fn misaligned_series_rejected() {
        let err = HourlyBundle::new(vec!["2024-01-01T00:00".into()])
            .with(HourlyField::Temperature, vec![1.0, 2.0])
            .unwrap_err();
        assert_eq!(err.len, 2);
        assert_eq!(err.expected, 1);
    }

    #[test]
    fn deserialize_validates_and_maps_nulls() {
        let ok: HourlyBundle = serde_json::from_str(
            r#"{"time":["2024-01-01T00:00","2024-01-01T01:00"],"temperature_2m":[1.5,null]}"#,
        )
        .unwrap();
        let temps = ok.series(HourlyField::Temperature);
        assert_eq!(temps[0], 1.5);
        assert!(temps[1].is_nan());
        assert!(ok.series(HourlyField::UvIndex).is_empty());

        let bad = serde_json::from_str::<HourlyBundle>(
            r#"{"time":["2024-01-01T00:00"],"precipitation":[0.1,0.2]}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn index_at_hour_today_and_other_days() {
        let range = DayRange { start: 24, end: 48 };
        assert_eq!(index_at_hour(range, 5, true), Some(29));
        assert_eq!(index_at_hour(range, 40, true), Some(47));
        assert_eq!(index_at_hour(range, 5, false), Some(36));
        assert_eq!(index_at_hour(DayRange { start: 0, end: 6 }, 3, false), Some(5));
        assert_eq!(index_at_hour(DayRange::EMPTY, 5, true), None);
    }

    #[test]
    fn local_hour_uses_zone() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(local_hour(now, "America/New_York"), 7);
        assert_eq!(local_hour(now, "Asia/Tokyo"), 21);
        assert_eq!(local_hour(now, "nowhere"), 12);
        assert_eq!(
            local_date(now, "Asia/Tokyo"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn first_at_or_after_falls_back_to_zero() {
        let times: Vec<String> = vec!["2024-01-01T00:00".into(), "2024-01-01T01:00".into()];
        assert_eq!(first_at_or_after(&times, "2024-01-01T00:30"), 1);
        assert_eq!(first_at_or_after(&times, "2025-01-01T00:00"), 0);
    }

    #[test]
    fn totals_and_formatting() {
        assert_eq!(total(&[0.1, f64::NAN, 0.2]).map(|v| (v * 10.0).round()), Some(3.0));
        assert_eq!(total(&[]), None);
        assert_eq!(format_value(Some(0.123), 2), "0.12");
        assert_eq!(format_value(Some(-0.2), 0), "0");
        assert_eq!(format_value(None, 1), "--");
        assert_eq!(format_value(Some(f64::NAN), 1), "--");
    }
}
