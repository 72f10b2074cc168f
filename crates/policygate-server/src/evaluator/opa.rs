//! Evaluator backed by an external policy engine's data API.
//!
//! Each call is one `POST {endpoint}/v1/data/{policy path}` with body
//! `{"input": {"user": {...}, "request": {...}}}`. No retries, no caching:
//! every answer reflects the engine's current policy state.
//!
//! Failure handling:
//! - unknown gateway: deny `unknown gateway` / zero limits, no request sent
//! - transport error, timeout, non-200, undecodable body: deny
//!   `policy evaluation error` / zero limits, error attached
//! - 200 with missing or mistyped fields: defaults substituted, result marked
//!   degraded and a warning logged
//! - reason text outside the known set: mapped to the default reason for the
//!   outcome, raw text kept in `metadata.engine_reason`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use policygate_core::error::{PolicyError, Result};
use policygate_core::extract::{EngineResult, FieldKind};
use policygate_core::path::policy_path;
use policygate_core::{
    Evaluated, PolicyDecision, PolicyKind, PolicyRequest, RateLimitRequest, RateLimits, Reason,
};

use super::PolicyEvaluator;
use crate::config::schema::OpaSection;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Bytes of a non-200 body kept in the error.
pub const MAX_ERROR_BODY: usize = 4096;

const ACCESS_FIELDS: [(&str, FieldKind); 2] =
    [("allow", FieldKind::Bool), ("reason", FieldKind::String)];
const RATE_LIMIT_FIELDS: [(&str, FieldKind); 2] = [
    ("requests_per_window", FieldKind::Integer),
    ("time_window_seconds", FieldKind::Integer),
];

#[derive(Debug, Clone)]
pub struct OpaEvaluator {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl OpaEvaluator {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| PolicyError::Config(format!("http client init failed: {e}")))?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Reuse a caller-owned client (connection pool, proxies, TLS roots).
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(cfg: &OpaSection) -> Result<Self> {
        Ok(Self::new(cfg.endpoint.clone())?.with_timeout(cfg.timeout()))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Access evaluation with a per-call timeout instead of the configured one.
    pub async fn evaluate_access_within(
        &self,
        req: &PolicyRequest,
        timeout: Duration,
    ) -> Evaluated<PolicyDecision> {
        let path = match req.gateway() {
            Ok(gateway) => policy_path(gateway, PolicyKind::Access),
            Err(e) => {
                tracing::warn!(gateway = %req.gateway, "access query for unknown gateway");
                return Evaluated::failed(PolicyDecision::deny(Reason::UnknownGateway), e);
            }
        };

        let result = match self.query(path, access_input(req), timeout).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(policy = path, class = e.class().as_str(), error = %e, "access evaluation failed");
                return Evaluated::failed(PolicyDecision::deny(Reason::PolicyEvaluationError), e);
            }
        };

        let allow = result.get_bool("allow");
        let engine_reason = result.get_str("reason");
        let reason = Reason::from_engine(engine_reason, allow);
        let decision = if allow {
            PolicyDecision::allow(reason)
        } else {
            PolicyDecision::deny(reason)
        };
        let mut decision = decision.with_policy_id(path);

        if !engine_reason.is_empty() && engine_reason != reason.as_str() {
            tracing::warn!(policy = path, engine_reason, %reason, "unrecognized engine reason mapped");
            decision.record_engine_reason(engine_reason);
        }

        let missing = result.missing(&ACCESS_FIELDS);
        if !missing.is_empty() {
            tracing::warn!(policy = path, ?missing, "policy engine result incomplete, using defaults");
            decision.mark_degraded(&missing);
        }

        tracing::debug!(
            policy = path,
            resource = %req.resource,
            allow = decision.allow,
            reason = %decision.reason,
            "access decision"
        );
        Evaluated::ok(decision)
    }

    /// Rate-limit evaluation with a per-call timeout instead of the configured one.
    pub async fn evaluate_rate_limit_within(
        &self,
        req: &RateLimitRequest,
        timeout: Duration,
    ) -> Evaluated<RateLimits> {
        let path = match req.gateway() {
            Ok(gateway) => policy_path(gateway, PolicyKind::RateLimit),
            Err(e) => {
                tracing::warn!(gateway = %req.gateway, "rate limit query for unknown gateway");
                return Evaluated::failed(RateLimits::deny_all(), e);
            }
        };

        let result = match self.query(path, rate_limit_input(req), timeout).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(policy = path, class = e.class().as_str(), error = %e, "rate limit evaluation failed");
                return Evaluated::failed(RateLimits::deny_all(), e);
            }
        };

        let requests = non_negative(result.get_int("requests_per_window"));
        let window = non_negative(result.get_int("time_window_seconds"));
        let mut limits = RateLimits::new(
            requests.unwrap_or(0),
            Duration::from_secs(window.unwrap_or(0)),
        );

        let mut missing = result.missing(&RATE_LIMIT_FIELDS);
        if requests.is_none() && !missing.contains(&"requests_per_window") {
            missing.push("requests_per_window");
        }
        if window.is_none() && !missing.contains(&"time_window_seconds") {
            missing.push("time_window_seconds");
        }
        if !missing.is_empty() {
            tracing::warn!(policy = path, ?missing, "policy engine result incomplete, using defaults");
            limits.degraded = true;
        }

        tracing::debug!(
            policy = path,
            requests_per_window = limits.requests_per_window,
            window_secs = limits.time_window.as_secs(),
            "rate limits"
        );
        Evaluated::ok(limits)
    }

    async fn query(&self, path: &str, input: Value, timeout: Duration) -> Result<EngineResult> {
        let url = format!("{}/v1/data/{}", self.endpoint, path);
        let resp = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&json!({ "input": input }))
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| transport_error(e, timeout))?;
        if status != StatusCode::OK {
            return Err(PolicyError::Status {
                status: status.as_u16(),
                body: error_body(&body),
            });
        }
        EngineResult::from_envelope(&body)
    }
}

#[async_trait]
impl PolicyEvaluator for OpaEvaluator {
    fn backend(&self) -> &'static str {
        "opa"
    }

    async fn evaluate_access(&self, req: &PolicyRequest) -> Evaluated<PolicyDecision> {
        self.evaluate_access_within(req, self.timeout).await
    }

    async fn evaluate_rate_limit(&self, req: &RateLimitRequest) -> Evaluated<RateLimits> {
        self.evaluate_rate_limit_within(req, self.timeout).await
    }
}

/// Engine input for an access query: caller identity apart from request facts.
pub fn access_input(req: &PolicyRequest) -> Value {
    json!({
        "user": {
            "user_id": req.user_id,
            "roles": req.roles,
        },
        "request": {
            "resource": req.resource,
            "action": req.action,
            "gateway": req.gateway,
            "client_ip": req.client_ip.as_deref().unwrap_or_default(),
            "headers": req.headers,
            "query_params": req.query_params,
        },
    })
}

pub fn rate_limit_input(req: &RateLimitRequest) -> Value {
    json!({
        "user": {
            "user_id": req.user_id,
        },
        "request": {
            "client_ip": req.client_ip,
            "gateway": req.gateway,
            "endpoint": req.endpoint.as_deref().unwrap_or_default(),
        },
    })
}

fn error_body(body: &[u8]) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return String::from_utf8_lossy(body).into_owned();
    }
    format!(
        "{}... ({} bytes truncated)",
        String::from_utf8_lossy(&body[..MAX_ERROR_BODY]),
        body.len() - MAX_ERROR_BODY
    )
}

fn non_negative(v: i64) -> Option<u64> {
    u64::try_from(v).ok()
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> PolicyError {
    if e.is_timeout() {
        PolicyError::Timeout(timeout)
    } else {
        PolicyError::Transport(e.to_string())
    }
}
