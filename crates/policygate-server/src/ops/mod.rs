//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/readyz`  : readiness (503 when draining)
//! - `/metrics` : Prometheus text format
//!
//! [`drain_on`] is the graceful-shutdown future: it flips readiness to 503 and
//! keeps the listener open for the grace period so load balancers can observe
//! the drain before connections are refused.

use std::future::Future;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    } else {
        (StatusCode::OK, "ready")
    }
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics().render(),
    )
        .into_response()
}

/// Resolves `grace` after `signal` fires. Draining is set as soon as the
/// signal arrives; requests keep being served until this future resolves.
pub async fn drain_on<F>(signal: F, state: AppState, grace: Duration)
where
    F: Future<Output = ()>,
{
    signal.await;
    state.set_draining();
    tracing::info!(?grace, "shutdown requested, draining");
    tokio::time::sleep(grace).await;
    tracing::info!("drain grace elapsed, closing listener");
}
