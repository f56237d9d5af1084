//! Forward and reverse geocoding against the Open-Meteo geocoding API.

use serde::Deserialize;
use serde_json::Value;

use crate::provider::WeatherProvider;
use crate::types::{join_place_parts, Coordinates, GeoPlace, WeatherError};

/// Entries stay raw so one malformed match does not sink the rest.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    results: Vec<ReverseEntry>,
}

#[derive(Debug, Deserialize)]
struct ReverseEntry {
    name: Option<String>,
    admin1: Option<String>,
    country: Option<String>,
}

impl WeatherProvider {
    /// Places matching `query`. A blank query returns nothing without a request.
    pub async fn search(
        &self,
        query: &str,
        count: u32,
        lang: &str,
    ) -> Result<Vec<GeoPlace>, WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let params = [
            ("name", query.to_string()),
            ("count", count.to_string()),
            ("language", lang.to_string()),
            ("format", "json".to_string()),
        ];
        let response: SearchResponse = self
            .get_json(&self.upstream.geocode_search_url, &params)
            .await?;

        let places: Vec<GeoPlace> = response
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(place) => Some(place),
                Err(e) => {
                    tracing::debug!("Skipping geocode entry: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Geocode '{}' -> {} results", query, places.len());
        Ok(places)
    }

    /// Reverse geocode coordinates to "Name, Region, Country".
    /// `Ok(None)` when upstream has no match.
    pub async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<String>, WeatherError> {
        let params = [
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("language", "en".to_string()),
            ("count", "1".to_string()),
        ];
        let response: ReverseResponse = self
            .get_json(&self.upstream.geocode_reverse_url, &params)
            .await?;

        let name = response.results.into_iter().next().map(|first| {
            join_place_parts(
                first.name.as_deref(),
                first.admin1.as_deref(),
                first.country.as_deref(),
            )
        });
        let name = name.filter(|n| !n.is_empty());

        if let Some(ref n) = name {
            tracing::info!("Reverse geocoded to: {}", n);
        }
        Ok(name)
    }
}

/// Clamp a requested result count into `1..=max`, defaulting when absent or unparseable.
///
/// Only the leading integer is read, so `"5.5"` and `"7abc"` count as 5 and 7.
pub fn clamp_count(raw: Option<&str>, default: u32, max: u32) -> u32 {
    let requested = raw
        .and_then(leading_int)
        .unwrap_or(i64::from(default));
    requested.clamp(1, i64::from(max.max(1))) as u32
}

fn leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    // Overflow saturates; the caller clamps anyway
    let value = rest[..digits].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}
