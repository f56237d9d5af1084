use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    Json,
};
use nimbus_weather::{AirQuality, Coordinates};

use super::LatLonParams;
use crate::state::AppState;

/// GET /air?lat&lon
///
/// Never fails; anything that goes wrong yields all-null readings.
pub async fn air_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<LatLonParams>,
) -> Json<AirQuality> {
    let coords = Coordinates::parse(params.lat(), params.lon())
        .and_then(|(lat, lon)| Coordinates::new(lat, lon).ok());
    let Some(coords) = coords else {
        return Json(AirQuality::default());
    };

    match state.provider.air_quality(coords).await {
        Ok(air) => Json(air),
        Err(e) => {
            tracing::warn!("Air quality fetch failed: {}", e);
            Json(AirQuality::default())
        }
    }
}
