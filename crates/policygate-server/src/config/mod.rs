//! Service config loader (strict parsing).

pub mod schema;

use std::fs;

use policygate_core::error::{PolicyError, Result};

pub use schema::{Backend, EvaluatorSection, OpaSection, ServerConfig, ServiceSection};

pub fn load_from_file(path: &str) -> Result<ServerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PolicyError::Config(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| PolicyError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
