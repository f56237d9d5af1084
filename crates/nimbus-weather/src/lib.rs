//! Weather data for Nimbus
//!
//! Upstream clients for Open-Meteo forecast, geocoding, air quality and
//! warnings, the radar frame listing and IP location, plus the pure slicing
//! helpers the views use to cut hourly arrays into day windows.

pub mod condition;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod radar;
pub mod slicing;
pub mod types;

pub use condition::{describe, icon, Theme, WeatherCondition};
pub use geocode::clamp_count;
pub use provider::WeatherProvider;
pub use radar::RadarListing;
pub use slicing::{
    day_range, index_at_hour, slice_series, summarize, DayRange, HourlyBundle, HourlyField,
    Summary,
};
pub use types::*;
