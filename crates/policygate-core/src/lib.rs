//! policygate core: decision data model, typed policy constants, path
//! resolution, engine response extraction and the access rules.
//!
//! This crate defines the contracts shared by both evaluators and by the
//! gateways that call them. It carries no transport or runtime dependencies so
//! it can be embedded directly into a gateway process.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Every fallible path surfaces as `PolicyError`/`Result`, and every evaluator
//! outcome is an [`Evaluated`] whose value is safe to act on even when an error
//! is attached.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod catalog;
pub mod error;
pub mod evaluated;
pub mod extract;
pub mod model;
pub mod path;
pub mod rules;

pub use catalog::{Gateway, PolicyKind, Reason, Role};
pub use error::{ErrorClass, PolicyError, Result};
pub use evaluated::Evaluated;
pub use model::{PolicyDecision, PolicyRequest, RateLimitRequest, RateLimits};
