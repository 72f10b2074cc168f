//! Metrics decorator around any evaluator.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use policygate_core::{Evaluated, Gateway, PolicyDecision, PolicyRequest, RateLimitRequest, RateLimits};

use super::PolicyEvaluator;
use crate::obs::EvaluatorMetrics;

pub struct InstrumentedEvaluator {
    inner: Arc<dyn PolicyEvaluator>,
    metrics: Arc<EvaluatorMetrics>,
}

impl InstrumentedEvaluator {
    pub fn new(inner: Arc<dyn PolicyEvaluator>, metrics: Arc<EvaluatorMetrics>) -> Self {
        Self { inner, metrics }
    }

    pub fn metrics(&self) -> &EvaluatorMetrics {
        &self.metrics
    }

    fn observe<T>(
        &self,
        operation: &'static str,
        started: Instant,
        out: &Evaluated<T>,
        degraded: bool,
    ) {
        self.metrics.evaluation_duration.observe(
            &[("backend", self.inner.backend()), ("operation", operation)],
            started.elapsed(),
        );
        if let Some(e) = out.error() {
            self.metrics
                .evaluation_errors
                .inc(&[("operation", operation), ("class", e.class().as_str())]);
        }
        if degraded {
            self.metrics.degraded_responses.inc(&[("operation", operation)]);
        }
    }
}

/// Keeps the in-flight gauge honest when a caller drops the future mid-call.
struct InFlight<'a> {
    metrics: &'a EvaluatorMetrics,
    operation: &'static str,
}

impl<'a> InFlight<'a> {
    fn enter(metrics: &'a EvaluatorMetrics, operation: &'static str) -> Self {
        metrics.evaluations_in_flight.inc(&[("operation", operation)]);
        Self { metrics, operation }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.metrics
            .evaluations_in_flight
            .dec(&[("operation", self.operation)]);
    }
}

/// Bounded label value: free-form gateway strings collapse to `unknown`.
fn gateway_label(raw: &str) -> &'static str {
    match raw.parse::<Gateway>() {
        Ok(g) => g.as_str(),
        Err(_) => "unknown",
    }
}

#[async_trait]
impl PolicyEvaluator for InstrumentedEvaluator {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn evaluate_access(&self, req: &PolicyRequest) -> Evaluated<PolicyDecision> {
        let started = Instant::now();
        let out = {
            let _guard = InFlight::enter(&self.metrics, "access");
            self.inner.evaluate_access(req).await
        };

        let decision = out.value();
        let outcome = if decision.allow { "allow" } else { "deny" };
        self.metrics
            .access_decisions
            .inc(&[("gateway", gateway_label(&req.gateway)), ("outcome", outcome)]);
        self.observe("access", started, &out, decision.is_degraded());
        out
    }

    async fn evaluate_rate_limit(&self, req: &RateLimitRequest) -> Evaluated<RateLimits> {
        let started = Instant::now();
        let out = {
            let _guard = InFlight::enter(&self.metrics, "rate_limit");
            self.inner.evaluate_rate_limit(req).await
        };

        self.metrics
            .rate_limit_lookups
            .inc(&[("gateway", gateway_label(&req.gateway))]);
        self.observe("rate_limit", started, &out, out.value().degraded);
        out
    }
}
