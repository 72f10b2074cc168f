//! Top-level facade crate for policygate.
//!
//! Re-exports the core decision model and the evaluator/server library so
//! gateways can depend on a single crate.

pub mod core {
    pub use policygate_core::*;
}

pub mod server {
    pub use policygate_server::*;
}

pub use policygate_core::{Evaluated, PolicyDecision, PolicyRequest, RateLimitRequest, RateLimits};
pub use policygate_server::{InMemoryEvaluator, OpaEvaluator, PolicyEvaluator};
