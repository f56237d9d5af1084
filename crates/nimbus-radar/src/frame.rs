//! Radar frame records and tile URLs.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// One radar scan, past or nowcast. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Unix seconds
    pub time: i64,
    /// Opaque tile path id
    pub path: String,
}

impl Frame {
    pub fn new(time: i64, path: impl Into<String>) -> Self {
        Self {
            time,
            path: path.into(),
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }

    /// Local clock label such as `3:45 PM PDT`. Unknown zones fall back to UTC.
    pub fn label(&self, timezone: &str) -> String {
        let Some(ts) = self.timestamp() else {
            return "Radar".to_string();
        };
        match timezone.parse::<Tz>() {
            Ok(tz) => ts.with_timezone(&tz).format("%-I:%M %p %Z").to_string(),
            Err(_) => ts.format("%-I:%M %p UTC").to_string(),
        }
    }
}

/// Builds tile URL templates for a radar tile host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    base: String,
}

impl TileSource {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// `{z}/{x}/{y}` placeholders are left for the map widget to fill.
    pub fn url_for_path(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        let path = path.strip_prefix("v2/radar/").unwrap_or(path);
        format!("{}/v2/radar/{}/512/{{z}}/{{x}}/{{y}}/2/1_1.png", self.base, path)
    }

    /// URL template with a `{path}` placeholder for the frame path.
    pub fn template(&self) -> String {
        self.url_for_path("{path}")
    }

    /// Single "latest" layer used when no frame listing is available.
    pub fn fallback_url(&self) -> String {
        self.url_for_path("nowcast_0")
    }
}
