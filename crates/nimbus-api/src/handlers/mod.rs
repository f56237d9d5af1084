//! Route handlers.
//!
//! `/weather` and `/reverse-geocode` reject bad input with 400. Every other
//! route absorbs upstream failures and answers 200 with an empty result.

pub mod air;
pub mod alerts;
pub mod geocode;
pub mod health;
pub mod radar;
pub mod weather;

use serde::Deserialize;

/// `lat`/`lon` pair shared by most routes. Kept as strings so the handlers
/// decide how to treat missing and malformed values.
#[derive(Debug, Default, Deserialize)]
pub struct LatLonParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub unit: Option<String>,
    pub lang: Option<String>,
}

impl LatLonParams {
    pub(crate) fn lat(&self) -> Option<&str> {
        non_empty(self.lat.as_deref())
    }

    pub(crate) fn lon(&self) -> Option<&str> {
        non_empty(self.lon.as_deref())
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
