//! Evaluator seam between gateways and decision backends.
//!
//! Both backends answer the same two questions and always hand back a value
//! that is safe to apply; see [`Evaluated`].

pub mod in_memory;
pub mod instrumented;
pub mod opa;

use std::sync::Arc;

use async_trait::async_trait;

use policygate_core::{Evaluated, PolicyDecision, PolicyRequest, RateLimitRequest, RateLimits};
use policygate_core::error::Result;

use crate::config::schema::{Backend, EvaluatorSection};

pub use in_memory::InMemoryEvaluator;
pub use instrumented::InstrumentedEvaluator;
pub use opa::OpaEvaluator;

/// Stateless after construction; share one instance across tasks.
#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
    /// Short backend name for logs and metrics.
    fn backend(&self) -> &'static str;
    async fn evaluate_access(&self, req: &PolicyRequest) -> Evaluated<PolicyDecision>;
    async fn evaluate_rate_limit(&self, req: &RateLimitRequest) -> Evaluated<RateLimits>;
}

/// Build the configured backend.
pub fn from_config(section: &EvaluatorSection) -> Result<Arc<dyn PolicyEvaluator>> {
    match section.backend {
        Backend::InMemory => Ok(Arc::new(InMemoryEvaluator::new())),
        Backend::Opa => {
            let opa = section.require_opa()?;
            Ok(Arc::new(OpaEvaluator::from_config(opa)?))
        }
    }
}
