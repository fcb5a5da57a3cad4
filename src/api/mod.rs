//! HTTP API — axum server for the user-facing endpoints.
//!
//! Profile read, bot toggle, strategy read/replace, health check.
//! All endpoints return JSON and go through the shared `ProfileStore`
//! handle; the handlers keep no state of their own.
//! CORS is restricted to the configured frontend origin when one is set.

pub mod routes;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use routes::AppState;

/// Build the axum router with all routes and middleware.
pub fn build_router(state: AppState, frontend_origin: Option<String>) -> Router {
    let cors = match frontend_origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new().allow_origin(value),
            Err(_) => {
                warn!(origin = %origin, "Invalid frontend origin — allowing any");
                CorsLayer::new().allow_origin(Any)
            }
        },
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods([Method::GET, Method::POST, Method::PUT])
    .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/profile", get(routes::get_profile))
        .route("/api/bot/toggle", post(routes::toggle_bot))
        .route(
            "/api/strategies",
            get(routes::get_strategies).put(routes::put_strategies),
        )
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
