//! Shared error type across policygate crates.

use std::time::Duration;

use thiserror::Error;

/// Coarse error classes (stable API, used in logs, metrics and HTTP bodies).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Unknown gateway / policy kind, invalid configuration.
    Configuration,
    /// Request construction or execution against the policy engine failed.
    Transport,
    /// Non-200 status or malformed envelope from the policy engine.
    Protocol,
}

impl ErrorClass {
    /// String representation used in JSON responses and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Configuration => "CONFIGURATION",
            ErrorClass::Transport => "TRANSPORT",
            ErrorClass::Protocol => "PROTOCOL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Unified error type used by core and server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("unknown gateway: {0}")]
    UnknownGateway(String),
    #[error("unknown policy type: {0}")]
    UnknownPolicyKind(String),
    #[error("policy engine request failed: {0}")]
    Transport(String),
    #[error("policy engine did not answer within {0:?}")]
    Timeout(Duration),
    #[error("policy engine returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed policy engine response: {0}")]
    Decode(String),
    #[error("invalid config: {0}")]
    Config(String),
}

impl PolicyError {
    /// Map an error to its stable class.
    pub fn class(&self) -> ErrorClass {
        match self {
            PolicyError::UnknownGateway(_)
            | PolicyError::UnknownPolicyKind(_)
            | PolicyError::Config(_) => ErrorClass::Configuration,
            PolicyError::Transport(_) | PolicyError::Timeout(_) => ErrorClass::Transport,
            PolicyError::Status { .. } | PolicyError::Decode(_) => ErrorClass::Protocol,
        }
    }
}
