//! Gateway/category to policy-engine data path.

use crate::catalog::{Gateway, PolicyKind};
use crate::error::Result;

pub const ADMIN_RBAC_PATH: &str = "admin_gateway/rbac";
pub const ADMIN_RATE_LIMIT_PATH: &str = "admin_gateway/rate_limit";
pub const PUBLIC_ANONYMOUS_ACCESS_PATH: &str = "public_gateway/anonymous_access";
pub const PUBLIC_RATE_LIMIT_PATH: &str = "public_gateway/rate_limit";

/// Typed resolution; total over the closed enums.
pub fn policy_path(gateway: Gateway, kind: PolicyKind) -> &'static str {
    match (gateway, kind) {
        (Gateway::Admin, PolicyKind::Access) => ADMIN_RBAC_PATH,
        (Gateway::Admin, PolicyKind::RateLimit) => ADMIN_RATE_LIMIT_PATH,
        (Gateway::Public, PolicyKind::Access) => PUBLIC_ANONYMOUS_ACCESS_PATH,
        (Gateway::Public, PolicyKind::RateLimit) => PUBLIC_RATE_LIMIT_PATH,
    }
}

/// Resolve from the raw strings carried on requests.
///
/// The gateway is checked first, so a request that gets both wrong reports
/// `UnknownGateway`.
pub fn resolve_policy_path(gateway: &str, kind: &str) -> Result<&'static str> {
    let gateway: Gateway = gateway.parse()?;
    let kind: PolicyKind = kind.parse()?;
    Ok(policy_path(gateway, kind))
}
