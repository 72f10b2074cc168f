//! Evaluator outcome: a value that is always safe to act on, plus the error
//! (if any) that forced it to a fail-safe default.

use crate::error::{PolicyError, Result};

#[derive(Debug, Clone, PartialEq)]
#[must_use = "an evaluation may carry an error that should be logged"]
pub struct Evaluated<T> {
    value: T,
    error: Option<PolicyError>,
}

impl<T> Evaluated<T> {
    pub fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    /// `fallback` must be the deny / zero-limit default for `T`.
    pub fn failed(fallback: T, error: PolicyError) -> Self {
        Self {
            value: fallback,
            error: Some(error),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn error(&self) -> Option<&PolicyError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_parts(self) -> (T, Option<PolicyError>) {
        (self.value, self.error)
    }

    /// Drop the fallback value and surface the error, if there was one.
    pub fn into_result(self) -> Result<T> {
        match self.error {
            None => Ok(self.value),
            Some(e) => Err(e),
        }
    }

    /// The value, discarding any error. Safe because failures carry a
    /// fail-safe fallback.
    pub fn into_value(self) -> T {
        self.value
    }
}
