//! Value types exchanged between gateways and evaluators.
//!
//! All four are transient: built per request by the calling gateway, handed
//! to an evaluator and dropped once the decision is consumed.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::{Gateway, Reason, Role};
use crate::error::Result;

/// An access-control question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyRequest {
    /// Empty means anonymous.
    pub user_id: String,
    pub roles: Vec<String>,
    /// Path being accessed.
    pub resource: String,
    /// HTTP method / operation.
    pub action: String,
    /// `admin-gateway` or `public-gateway`; anything else matches no policy.
    pub gateway: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub query_params: BTreeMap<String, String>,
}

impl PolicyRequest {
    pub fn new(
        gateway: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            gateway: gateway.into(),
            resource: resource.into(),
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>, roles: &[&str]) -> Self {
        self.user_id = user_id.into();
        self.roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_empty()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| Role::parse(r) == Some(role))
    }

    pub fn gateway(&self) -> Result<Gateway> {
        self.gateway.parse()
    }
}

/// Result of an access evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allow: bool,
    pub reason: Reason,
    /// Policy path that produced the decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl PolicyDecision {
    pub fn allow(reason: Reason) -> Self {
        Self {
            allow: true,
            reason,
            policy_id: None,
            metadata: Map::new(),
        }
    }

    pub fn deny(reason: Reason) -> Self {
        Self {
            allow: false,
            reason,
            policy_id: None,
            metadata: Map::new(),
        }
    }

    pub fn with_policy_id(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id = Some(policy_id.into());
        self
    }

    /// Mark the decision as built from an incomplete engine response.
    pub fn mark_degraded(&mut self, missing_fields: &[&str]) {
        self.metadata.insert("degraded".into(), Value::Bool(true));
        self.metadata.insert(
            "missing_fields".into(),
            Value::Array(
                missing_fields
                    .iter()
                    .map(|f| Value::String(f.to_string()))
                    .collect(),
            ),
        );
    }

    /// Keep engine reason text that did not map onto a known reason.
    pub fn record_engine_reason(&mut self, text: &str) {
        self.metadata
            .insert("engine_reason".into(), Value::String(text.to_string()));
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.metadata.get("degraded"), Some(Value::Bool(true)))
    }
}

/// A rate-limit question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitRequest {
    pub user_id: String,
    pub client_ip: String,
    pub gateway: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl RateLimitRequest {
    pub fn new(gateway: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
            ..Self::default()
        }
    }

    pub fn gateway(&self) -> Result<Gateway> {
        self.gateway.parse()
    }
}

/// Limit parameters for an external limiter. A zero budget means deny all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    pub requests_per_window: u64,
    #[serde(rename = "time_window_seconds", with = "window_secs")]
    pub time_window: Duration,
    /// Reserved for a limiter integration; never populated by the evaluators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_count: Option<u64>,
    /// Reserved for a limiter integration; never populated by the evaluators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<DateTime<Utc>>,
    /// Set when the engine answered without the expected fields.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl RateLimits {
    pub fn new(requests_per_window: u64, time_window: Duration) -> Self {
        Self {
            requests_per_window,
            time_window,
            ..Self::default()
        }
    }

    /// The fail-safe budget paired with every error.
    pub fn deny_all() -> Self {
        Self::default()
    }

    pub fn is_deny_all(&self) -> bool {
        self.requests_per_window == 0 || self.time_window.is_zero()
    }
}

mod window_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
