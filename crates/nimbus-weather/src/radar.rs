//! Radar frame listing.

pub use nimbus_radar::{Frame, TileSource};
use serde::Deserialize;

use crate::provider::WeatherProvider;
use crate::types::WeatherError;

#[derive(Debug, Default, Deserialize)]
struct RadarBlock {
    #[serde(default)]
    past: Vec<Frame>,
    #[serde(default)]
    nowcast: Vec<Frame>,
}

#[derive(Debug, Deserialize)]
struct MapsListing {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    radar: RadarBlock,
}

/// Frames ready for the sequencer plus the tile source to draw them from.
#[derive(Debug, Clone)]
pub struct RadarListing {
    pub frames: Vec<Frame>,
    pub tiles: TileSource,
}

impl WeatherProvider {
    /// The last `past_limit` past scans followed by every nowcast scan, oldest first.
    pub async fn radar_frames(&self, past_limit: usize) -> Result<RadarListing, WeatherError> {
        let listing: MapsListing = self
            .get_json(&self.upstream.radar_listing_url, &[])
            .await?;

        let RadarBlock { mut past, nowcast } = listing.radar;
        past.sort_by_key(|f| f.time);
        let skip = past.len().saturating_sub(past_limit);
        let mut frames: Vec<Frame> = past.into_iter().skip(skip).collect();
        frames.extend(nowcast);

        let host = listing
            .host
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| self.upstream.radar_tile_base.clone());

        tracing::debug!("Radar listing: {} frames from {}", frames.len(), host);
        Ok(RadarListing {
            frames,
            tiles: TileSource::new(host),
        })
    }
}
