//! Network-free evaluator answering from the built-in rules.

use async_trait::async_trait;

use policygate_core::path::policy_path;
use policygate_core::{
    rules, Evaluated, PolicyDecision, PolicyKind, PolicyRequest, RateLimitRequest, RateLimits,
};

use super::PolicyEvaluator;

#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryEvaluator;

impl InMemoryEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PolicyEvaluator for InMemoryEvaluator {
    fn backend(&self) -> &'static str {
        "in_memory"
    }

    async fn evaluate_access(&self, req: &PolicyRequest) -> Evaluated<PolicyDecision> {
        let mut decision = rules::decide_access(req);
        if let Ok(gateway) = req.gateway() {
            decision.policy_id = Some(policy_path(gateway, PolicyKind::Access).to_string());
        }
        tracing::debug!(
            gateway = %req.gateway,
            resource = %req.resource,
            allow = decision.allow,
            reason = %decision.reason,
            "in-memory access decision"
        );
        Evaluated::ok(decision)
    }

    async fn evaluate_rate_limit(&self, req: &RateLimitRequest) -> Evaluated<RateLimits> {
        match rules::default_rate_limits(req) {
            Ok(limits) => Evaluated::ok(limits),
            Err(e) => {
                tracing::warn!(gateway = %req.gateway, error = %e, "rate limit for unknown gateway");
                Evaluated::failed(RateLimits::deny_all(), e)
            }
        }
    }
}
