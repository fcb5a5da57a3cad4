//! API route handlers.
//!
//! Handlers share an `Arc<ApiContext>` holding the store handle. Store
//! failures map to 502 with a JSON error body; an unknown user is 404.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::store::{fields, ProfileStore, StoreError};
use crate::types::awaiting_funds;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// State accessible by all route handlers.
pub struct ApiContext {
    pub store: Arc<dyn ProfileStore>,
}

pub type AppState = Arc<ApiContext>;

// ---------------------------------------------------------------------------
// Request/response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub zar: Decimal,
    pub btc: Decimal,
    pub strategies: Vec<i64>,
    #[serde(rename = "botActive")]
    pub bot_active: bool,
    #[serde(rename = "awaitingFunds")]
    pub awaiting_funds: bool,
}

#[derive(Debug, Deserialize)]
pub struct TogglePayload {
    pub activate: bool,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub success: bool,
    #[serde(rename = "botActive")]
    pub bot_active: bool,
    #[serde(rename = "awaitingFunds")]
    pub awaiting_funds: bool,
}

#[derive(Debug, Deserialize)]
pub struct StrategiesPayload {
    pub strategies: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct StrategiesResponse {
    pub strategies: Vec<i64>,
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn store_error(e: StoreError) -> ApiError {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

fn not_found(user_id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("User not found: {user_id}"),
        }),
    )
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/profile?user_id=
pub async fn get_profile(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state
        .store
        .get_profile(&query.user_id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| not_found(&query.user_id))?;

    Ok(Json(ProfileResponse {
        user_id: query.user_id,
        zar: profile.zar_balance,
        btc: profile.btc_balance,
        strategies: profile.strategies,
        bot_active: profile.bot_active,
        awaiting_funds: profile.awaiting_funds,
    }))
}

/// POST /api/bot/toggle?user_id=
///
/// Applies the toggle contract: activating while under-funded immediately
/// sets `awaitingFunds`; deactivating, or activating with a positive
/// balance, clears it. Uses the same predicate as the reconciler.
pub async fn toggle_bot(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
    Json(payload): Json<TogglePayload>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let fiat_balance = state
        .store
        .get_field(&query.user_id, fields::ZAR_BALANCE)
        .await
        .map_err(store_error)?
        .and_then(|v| serde_json::from_value::<Decimal>(v).ok())
        .unwrap_or(Decimal::ZERO);

    let awaiting = awaiting_funds(payload.activate, fiat_balance);

    let mut patch = Map::new();
    patch.insert(fields::BOT_ACTIVE.to_string(), Value::Bool(payload.activate));
    patch.insert(fields::AWAITING_FUNDS.to_string(), Value::Bool(awaiting));
    state
        .store
        .patch(&query.user_id, patch)
        .await
        .map_err(store_error)?;

    info!(
        user_id = %query.user_id,
        active = payload.activate,
        awaiting_funds = awaiting,
        "Bot toggled"
    );

    Ok(Json(ToggleResponse {
        success: true,
        bot_active: payload.activate,
        awaiting_funds: awaiting,
    }))
}

/// GET /api/strategies?user_id=
pub async fn get_strategies(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<StrategiesResponse>, ApiError> {
    let strategies = state
        .store
        .get_field(&query.user_id, fields::STRATEGIES)
        .await
        .map_err(store_error)?
        .and_then(|v| serde_json::from_value::<Vec<i64>>(v).ok())
        .unwrap_or_default();

    Ok(Json(StrategiesResponse { strategies }))
}

/// PUT /api/strategies?user_id=
pub async fn put_strategies(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
    Json(payload): Json<StrategiesPayload>,
) -> Result<Json<StrategiesResponse>, ApiError> {
    let mut patch = Map::new();
    patch.insert(
        fields::STRATEGIES.to_string(),
        json!(payload.strategies),
    );
    state
        .store
        .patch(&query.user_id, patch)
        .await
        .map_err(store_error)?;

    Ok(Json(StrategiesResponse {
        strategies: payload.strategies,
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
