use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    Json,
};
use nimbus_weather::{Alert, Coordinates};
use serde::Serialize;

use super::{non_empty, LatLonParams};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
}

/// GET /alerts?lat&lon&lang
pub async fn alerts_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<LatLonParams>,
) -> Json<AlertsResponse> {
    let coords = Coordinates::parse(params.lat(), params.lon())
        .and_then(|(lat, lon)| Coordinates::new(lat, lon).ok());
    let Some(coords) = coords else {
        return Json(AlertsResponse { alerts: Vec::new() });
    };
    let lang = non_empty(params.lang.as_deref()).unwrap_or(&state.config.weather.default_lang);

    let alerts = match state.provider.alerts(coords, lang).await {
        Ok(alerts) => alerts,
        Err(e) => {
            tracing::warn!("Alerts fetch failed: {}", e);
            Vec::new()
        }
    };

    Json(AlertsResponse { alerts })
}
