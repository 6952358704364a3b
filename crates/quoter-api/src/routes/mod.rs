//! API route handlers

pub mod clmm;
pub mod config;
pub mod health;
pub mod routing;

use axum::{routing::get, Router};

use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/config", config::router())
        .nest("/clmm", clmm::router())
        .nest("/routing", routing::router())
        .with_state(state)
}
