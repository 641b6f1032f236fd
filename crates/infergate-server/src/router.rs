//! Axum router wiring.
//!
//! `GET /health`, `POST /predict`, `GET /metrics`; anything else gets a JSON 404.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.cfg().server.max_body_bytes;

    Router::new()
        .route("/health", get(ops::health))
        .route("/predict", post(transport::predict::predict))
        .route("/metrics", get(ops::metrics))
        .fallback(ops::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
