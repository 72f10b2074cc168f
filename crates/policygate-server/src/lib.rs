//! policygate server library entry.
//!
//! Wires the evaluator backends, configuration, metrics and HTTP surface into
//! a decision service. Gateways can also embed the evaluators directly and
//! skip the HTTP hop.

pub mod api;
pub mod app_state;
pub mod config;
pub mod evaluator;
pub mod obs;
pub mod ops;
pub mod router;

pub use evaluator::{InMemoryEvaluator, InstrumentedEvaluator, OpaEvaluator, PolicyEvaluator};
