//! Geocoding handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nimbus_weather::{clamp_count, Coordinates};
use serde::Deserialize;
use serde_json::json;

use super::{non_empty, LatLonParams};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GeocodeParams {
    pub q: Option<String>,
    pub count: Option<String>,
    pub lang: Option<String>,
}

/// GET /geocode?q&count&lang
pub async fn geocode_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<GeocodeParams>,
) -> Response {
    let Some(query) = non_empty(params.q.as_deref()) else {
        return Json(json!({ "results": [] })).into_response();
    };

    let weather = &state.config.weather;
    let count = clamp_count(
        params.count.as_deref(),
        weather.geocode_default_count,
        weather.geocode_max_count,
    );
    let lang = non_empty(params.lang.as_deref()).unwrap_or(&weather.default_lang);

    let results = match state.provider.search(query, count, lang).await {
        Ok(places) => places,
        Err(e) => {
            tracing::warn!("Geocode search failed: {}", e);
            Vec::new()
        }
    };

    Json(json!({ "results": results })).into_response()
}

/// GET /reverse-geocode?lat&lon
pub async fn reverse_geocode_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<LatLonParams>,
) -> Response {
    let (Some(lat), Some(lon)) = (params.lat(), params.lon()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "lat and lon are required" })),
        )
            .into_response();
    };

    let Some((lat, lon)) = Coordinates::parse(Some(lat), Some(lon)) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "lat and lon must be numeric" })),
        )
            .into_response();
    };

    let name = match Coordinates::new(lat, lon) {
        Ok(coords) => match state.provider.reverse_geocode(coords).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("Reverse geocode failed: {}", e);
                None
            }
        },
        Err(e) => {
            tracing::debug!("Reverse geocode skipped: {}", e);
            None
        }
    };

    Json(json!({ "name": name })).into_response()
}
