//! Access and rate-limit rules as pure functions.
//!
//! This is the single encoding of policy intent used without a live engine:
//! the in-memory evaluator answers from it, and the network evaluator's tests
//! serve its answers from a mock engine to check both agree.
//!
//! Access rules, first match wins:
//! 1. admin gateway, `admin` role, admin namespace: allow
//! 2. admin gateway, `user` role without `admin`, admin namespace: insufficient permissions
//! 3. admin gateway, anonymous, admin namespace: authentication required
//! 4. public gateway, public namespace: allow, authenticated or not
//! 5. public gateway, anonymous, sensitive segment: authentication required
//! 6. anything else: no matching policy

use crate::catalog::{
    Gateway, Reason, Role, ADMIN_PREFIX, DEFAULT_WINDOW, PUBLIC_PREFIX, SENSITIVE_SEGMENTS,
};
use crate::error::Result;
use crate::model::{PolicyDecision, PolicyRequest, RateLimitRequest, RateLimits};

pub fn decide_access(req: &PolicyRequest) -> PolicyDecision {
    let Ok(gateway) = req.gateway() else {
        return PolicyDecision::deny(Reason::NoMatchingPolicy);
    };

    match gateway {
        Gateway::Admin if req.resource.starts_with(ADMIN_PREFIX) => {
            if req.has_role(Role::Admin) {
                PolicyDecision::allow(Reason::AdminFullAccess)
            } else if req.has_role(Role::User) {
                PolicyDecision::deny(Reason::InsufficientPermissions)
            } else if req.is_anonymous() {
                PolicyDecision::deny(Reason::AuthenticationRequired)
            } else {
                PolicyDecision::deny(Reason::NoMatchingPolicy)
            }
        }
        Gateway::Public if req.resource.starts_with(PUBLIC_PREFIX) => {
            PolicyDecision::allow(Reason::PublicEndpoint)
        }
        Gateway::Public if req.is_anonymous() && touches_sensitive(&req.resource) => {
            PolicyDecision::deny(Reason::AuthenticationRequired)
        }
        _ => PolicyDecision::deny(Reason::NoMatchingPolicy),
    }
}

/// Fixed per-gateway budget. Unknown gateways get `UnknownGateway`; callers
/// pair it with [`RateLimits::deny_all`].
pub fn default_rate_limits(req: &RateLimitRequest) -> Result<RateLimits> {
    let gateway = req.gateway()?;
    Ok(RateLimits::new(
        gateway.default_requests_per_window(),
        DEFAULT_WINDOW,
    ))
}

fn touches_sensitive(resource: &str) -> bool {
    resource
        .split('/')
        .any(|segment| SENSITIVE_SEGMENTS.contains(&segment))
}
