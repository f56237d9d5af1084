use std::sync::Arc;

use axum::{extract::Extension, Json};
use nimbus_weather::radar::{Frame, RadarListing, TileSource};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarFramesResponse {
    pub frames: Vec<Frame>,
    pub tile_template: String,
    pub fallback_tile: String,
}

/// GET /radar/frames
///
/// An empty `frames` list tells the client to show the fallback tile.
pub async fn radar_frames_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<RadarFramesResponse> {
    let past_limit = state.config.radar.past_frames;

    let (frames, tiles) = match state.provider.radar_frames(past_limit).await {
        Ok(RadarListing { frames, tiles }) => (frames, tiles),
        Err(e) => {
            tracing::warn!("Radar listing failed, using static layer: {}", e);
            (
                Vec::new(),
                TileSource::new(state.config.upstream.radar_tile_base.as_str()),
            )
        }
    };

    Json(RadarFramesResponse {
        frames,
        tile_template: tiles.template(),
        fallback_tile: tiles.fallback_url(),
    })
}
