//! View state for the Nimbus dashboard.
//!
//! Everything here is plain data plus the logic that derives it, so a
//! rendering layer only has to draw what these models hold.

pub mod client;
pub mod compare;
pub mod current;
pub mod dashboard;
pub mod day;
pub mod deeplink;
pub mod search;
pub mod sparkline;

pub use client::{ApiClient, WeatherSource};
pub use compare::{compare, ComparisonRow};
pub use current::{current_card, day_list, next_hours, CurrentCard, DayRow, NextHours};
pub use dashboard::{Dashboard, DeviceLocation, LoadReason, Location, PendingLoad, Snapshot};
pub use day::{DayView, HourRow};
pub use deeplink::ViewTarget;
pub use search::{Key, KeyAction, SearchBox, SearchOutcome};
