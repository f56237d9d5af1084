//! Nimbus proxy routes
//!
//! Thin, stateless handlers that forward query parameters to the upstream
//! weather APIs and reshape the JSON for the dashboard.

pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Extension, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

pub use state::AppState;

/// Build the router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/weather", get(handlers::weather::weather_handler))
        .route("/geocode", get(handlers::geocode::geocode_handler))
        .route(
            "/reverse-geocode",
            get(handlers::geocode::reverse_geocode_handler),
        )
        .route("/air", get(handlers::air::air_handler))
        .route("/alerts", get(handlers::alerts::alerts_handler))
        .route("/radar/frames", get(handlers::radar::radar_frames_handler))
        .route("/health", get(handlers::health::health_handler))
        .layer(Extension(state))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
