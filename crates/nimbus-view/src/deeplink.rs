//! Query-string deep links into a location, unit and optional date.

use chrono::NaiveDate;
use nimbus_core::Unit;
use nimbus_weather::Coordinates;
use url::{form_urlencoded, Url};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewTarget {
    pub coords: Coordinates,
    pub name: Option<String>,
    pub unit: Unit,
    pub timezone: Option<String>,
    /// `YYYY-MM-DD` for the day view
    pub date: Option<String>,
}

impl ViewTarget {
    pub fn new(coords: Coordinates, unit: Unit) -> Self {
        Self {
            coords,
            name: None,
            unit,
            timezone: None,
            date: None,
        }
    }

    /// Parse a query string (with or without the leading `?`).
    ///
    /// Needs valid `lat` and `lon`. Other keys are optional; an unparseable
    /// `date` is dropped rather than rejecting the link.
    pub fn parse(query: &str) -> Option<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut lat = None;
        let mut lon = None;
        let mut target_name = None;
        let mut unit = None;
        let mut timezone = None;
        let mut date = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim().to_string();
            match key.as_ref() {
                "lat" => lat = value.parse::<f64>().ok(),
                "lon" => lon = value.parse::<f64>().ok(),
                "name" if !value.is_empty() => target_name = Some(value),
                "unit" => unit = Some(value),
                "tz" if !value.is_empty() => timezone = Some(value),
                "date" => {
                    date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                        .ok()
                        .map(|_| value)
                }
                _ => {}
            }
        }

        let coords = Coordinates::new(lat?, lon?).ok()?;
        Some(Self {
            coords,
            name: target_name,
            unit: Unit::from_query(unit.as_deref()),
            timezone,
            date,
        })
    }

    pub fn from_url(url: &Url) -> Option<Self> {
        Self::parse(url.query().unwrap_or_default())
    }

    pub fn to_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        out.append_pair("lat", &self.coords.latitude.to_string());
        out.append_pair("lon", &self.coords.longitude.to_string());
        out.append_pair("unit", self.unit.as_str());
        if let Some(name) = &self.name {
            out.append_pair("name", name);
        }
        if let Some(tz) = &self.timezone {
            out.append_pair("tz", tz);
        }
        if let Some(date) = &self.date {
            out.append_pair("date", date);
        }
        out.finish()
    }

    /// Same place and unit, pointed at a specific day.
    pub fn for_date(&self, date: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            ..self.clone()
        }
    }

    /// Same place and unit, back to the dashboard.
    pub fn without_date(&self) -> Self {
        Self {
            date: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn parses_full_link() {
        let t = ViewTarget::parse("?lat=40.7&lon=-74&name=New%20York%2C%20NY&unit=metric&tz=America%2FNew_York&date=2024-03-05")
            .unwrap();
        assert_eq!(t.coords.latitude, 40.7);
        assert_eq!(t.name.as_deref(), Some("New York, NY"));
        assert_eq!(t.unit, Unit::Metric);
        assert_eq!(t.timezone.as_deref(), Some("America/New_York"));
        assert_eq!(t.date.as_deref(), Some("2024-03-05"));
    }

    #[test]
    fn lenient_about_optional_keys() {
        let t = ViewTarget::parse("lat=1&lon=2&unit=kelvin&date=tomorrow&name=").unwrap();
        assert_eq!(t.unit, Unit::Us);
        assert_eq!(t.date, None);
        assert_eq!(t.name, None);
    }

    #[test]
    fn requires_valid_coordinates() {
        assert!(ViewTarget::parse("lon=2").is_none());
        assert!(ViewTarget::parse("lat=x&lon=2").is_none());
        assert!(ViewTarget::parse("lat=95&lon=2").is_none());
    }

    #[test]
    fn query_round_trips() {
        let coords = Coordinates::new(51.5, -0.12).unwrap();
        let mut t = ViewTarget::new(coords, Unit::Metric);
        t.name = Some("London, England".into());
        let day = t.for_date("2024-06-01");
        let parsed = ViewTarget::parse(&day.to_query()).unwrap();
        assert_eq!(parsed, day);
        assert_eq!(parsed.without_date(), t);
    }

    #[test]
    fn from_url_reads_query() {
        let url = Url::parse("http://localhost:3000/day?lat=1&lon=2").unwrap();
        assert!(ViewTarget::from_url(&url).is_some());
    }
}
