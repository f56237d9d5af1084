//! Forecast proxy.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use nimbus_core::Unit;
use nimbus_weather::{Coordinates, WeatherError};
use serde_json::json;

use super::LatLonParams;
use crate::state::AppState;

/// GET /weather?lat&lon&unit
///
/// Upstream JSON is passed through verbatim on success.
pub async fn weather_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<LatLonParams>,
) -> Response {
    let unit = Unit::from_query(params.unit.as_deref());

    let coords = Coordinates::parse(params.lat(), params.lon())
        .and_then(|(lat, lon)| Coordinates::new(lat, lon).ok());
    let Some(coords) = coords else {
        tracing::debug!("Rejecting forecast request: lat={:?} lon={:?}", params.lat, params.lon);
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_lat_lon",
                "lat": params.lat,
                "lon": params.lon,
            })),
        )
            .into_response();
    };

    let today = Utc::now().date_naive();
    let days = state.config.weather.forecast_days;

    match state.provider.forecast_raw(coords, unit, today, days).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(WeatherError::Upstream { status, url, body }) => {
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (
                code,
                Json(json!({
                    "error": "upstream_error",
                    "status": status,
                    "url": url,
                    "body": body,
                })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Forecast request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "server_error" })),
            )
                .into_response()
        }
    }
}
