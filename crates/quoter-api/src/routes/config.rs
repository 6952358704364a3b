//! Quoter configuration endpoints

use axum::{extract::State, routing::get, Json, Router};

use quoter_core::AppConfig;

use crate::dto::{bad_request, ApiFailure, ConfigRequest};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_config).post(configure))
}

/// GET /config - Current configuration
async fn get_config(State(state): State<AppState>) -> Json<AppConfig> {
    Json(state.config().await)
}

/// POST /config - Update configuration
async fn configure(
    State(state): State<AppState>,
    Json(request): Json<ConfigRequest>,
) -> Result<Json<AppConfig>, ApiFailure> {
    let mut config = state.config().await;
    if let Some(program_id) = request.program_id {
        config.program_id = program_id;
    }
    if let Some(version) = request.protocol_version {
        config.protocol_version = version;
    }
    if let Some(policy) = request.fallback_policy {
        config.fallback_policy = policy;
    }
    if let Some(bps) = request.default_slippage_bps {
        config.default_slippage_bps = bps;
    }

    state
        .set_config(config.clone())
        .await
        .map_err(|e| bad_request(e.to_string()))?;

    Ok(Json(config))
}
