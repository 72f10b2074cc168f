//! Decision endpoints.
//!
//! Both always answer 200 with a value that is safe to apply; an evaluation
//! error travels alongside it in `error` for the caller to log.

use axum::{extract::State, Json};
use serde::Serialize;

use policygate_core::{Evaluated, PolicyDecision, PolicyError, PolicyRequest, RateLimitRequest, RateLimits};

use crate::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub class: &'static str,
    pub message: String,
}

impl From<&PolicyError> for ErrorBody {
    fn from(e: &PolicyError) -> Self {
        Self {
            class: e.class().as_str(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub decision: PolicyDecision,
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct RateLimitResponse {
    pub limits: RateLimits,
    pub error: Option<ErrorBody>,
}

fn split<T>(out: Evaluated<T>) -> (T, Option<ErrorBody>) {
    let (value, error) = out.into_parts();
    (value, error.as_ref().map(ErrorBody::from))
}

pub async fn access(
    State(state): State<AppState>,
    Json(req): Json<PolicyRequest>,
) -> Json<AccessResponse> {
    let (decision, error) = split(state.evaluator().evaluate_access(&req).await);
    Json(AccessResponse { decision, error })
}

pub async fn rate_limit(
    State(state): State<AppState>,
    Json(req): Json<RateLimitRequest>,
) -> Json<RateLimitResponse> {
    let (limits, error) = split(state.evaluator().evaluate_rate_limit(&req).await);
    Json(RateLimitResponse { limits, error })
}
