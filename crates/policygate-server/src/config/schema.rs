use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use policygate_core::error::{PolicyError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub service: ServiceSection,

    pub evaluator: EvaluatorSection,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PolicyError::Config(format!(
                "unsupported config version {} (expected 1)",
                self.version
            )));
        }
        self.service.validate()?;
        self.evaluator.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// How long `/readyz` reports draining before the listener closes.
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: u64,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            drain_grace_ms: default_drain_grace_ms(),
        }
    }
}

impl ServiceSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if self.drain_grace_ms > 60_000 {
            return Err(PolicyError::Config(
                "service.drain_grace_ms must be at most 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            PolicyError::Config(format!(
                "service.listen must be a valid socket address, got {:?}",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8282".into()
}

fn default_drain_grace_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Opa,
    InMemory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluatorSection {
    pub backend: Backend,

    #[serde(default)]
    pub opa: Option<OpaSection>,
}

impl EvaluatorSection {
    pub fn validate(&self) -> Result<()> {
        match (self.backend, &self.opa) {
            (Backend::Opa, None) => Err(PolicyError::Config(
                "evaluator.opa is required when backend is opa".into(),
            )),
            (_, Some(opa)) => opa.validate(),
            (Backend::InMemory, None) => Ok(()),
        }
    }

    pub fn require_opa(&self) -> Result<&OpaSection> {
        self.opa
            .as_ref()
            .ok_or_else(|| PolicyError::Config("evaluator.opa section missing".into()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpaSection {
    pub endpoint: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl OpaSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(PolicyError::Config(
                "evaluator.opa.endpoint must be an http(s) URL".into(),
            ));
        }
        if !(100..=60_000).contains(&self.timeout_ms) {
            return Err(PolicyError::Config(
                "evaluator.opa.timeout_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    5000
}
