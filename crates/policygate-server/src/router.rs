//! Axum router wiring.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{api, app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/access", post(api::access))
        .route("/v1/rate-limit", post(api::rate_limit))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
