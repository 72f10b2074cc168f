//! Closed vocabularies: gateways, policy kinds, roles and decision reasons.
//!
//! Requests arrive with free-form strings; these types are the only place the
//! recognized spellings live.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Resource namespace served by the admin gateway.
pub const ADMIN_PREFIX: &str = "/admin/";
/// Resource namespace the public gateway serves without authentication.
pub const PUBLIC_PREFIX: &str = "/api/v1/public/";
/// Path segments that require an authenticated caller on the public gateway.
pub const SENSITIVE_SEGMENTS: [&str; 2] = ["patients", "appointments"];

/// Window shared by both gateways' default budgets.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
pub const ADMIN_REQUESTS_PER_WINDOW: u64 = 100;
pub const PUBLIC_REQUESTS_PER_WINDOW: u64 = 1000;

/// API entry point whose requests are being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gateway {
    Admin,
    Public,
}

impl Gateway {
    pub fn as_str(self) -> &'static str {
        match self {
            Gateway::Admin => "admin-gateway",
            Gateway::Public => "public-gateway",
        }
    }

    /// Default budget for the in-memory evaluator.
    pub fn default_requests_per_window(self) -> u64 {
        match self {
            Gateway::Admin => ADMIN_REQUESTS_PER_WINDOW,
            Gateway::Public => PUBLIC_REQUESTS_PER_WINDOW,
        }
    }
}

impl FromStr for Gateway {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin-gateway" => Ok(Gateway::Admin),
            "public-gateway" => Ok(Gateway::Public),
            other => Err(PolicyError::UnknownGateway(other.to_string())),
        }
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule set a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Access,
    RateLimit,
}

impl PolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Access => "access",
            PolicyKind::RateLimit => "rate_limit",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(PolicyKind::Access),
            "rate_limit" => Ok(PolicyKind::RateLimit),
            other => Err(PolicyError::UnknownPolicyKind(other.to_string())),
        }
    }
}

/// Roles the access rules know about. Any other role string is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
    HealthcareStaff,
    UserManager,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::HealthcareStaff => "healthcare_staff",
            Role::UserManager => "user_manager",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            "healthcare_staff" => Some(Role::HealthcareStaff),
            "user_manager" => Some(Role::UserManager),
            _ => None,
        }
    }
}

/// Why a decision came out the way it did. Closed set; never renders as an
/// empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Reason {
    AdminFullAccess,
    InsufficientPermissions,
    AuthenticationRequired,
    PublicEndpoint,
    UnknownGateway,
    PolicyEvaluationError,
    NoMatchingPolicy,
    /// The engine allowed the request without a recognized reason.
    PolicyAllowed,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::AdminFullAccess => "admin role permits all admin operations",
            Reason::InsufficientPermissions => "insufficient permissions",
            Reason::AuthenticationRequired => "authentication required",
            Reason::PublicEndpoint => "public endpoint allows anonymous access",
            Reason::UnknownGateway => "unknown gateway",
            Reason::PolicyEvaluationError => "policy evaluation error",
            Reason::NoMatchingPolicy => "no matching policy",
            Reason::PolicyAllowed => "allowed by policy",
        }
    }

    pub fn parse(s: &str) -> Option<Reason> {
        match s {
            "admin role permits all admin operations" => Some(Reason::AdminFullAccess),
            "insufficient permissions" => Some(Reason::InsufficientPermissions),
            "authentication required" => Some(Reason::AuthenticationRequired),
            "public endpoint allows anonymous access" => Some(Reason::PublicEndpoint),
            "unknown gateway" => Some(Reason::UnknownGateway),
            "policy evaluation error" => Some(Reason::PolicyEvaluationError),
            "no matching policy" => Some(Reason::NoMatchingPolicy),
            "allowed by policy" => Some(Reason::PolicyAllowed),
            _ => None,
        }
    }

    /// Reasons a deny may carry.
    pub fn is_deny_reason(self) -> bool {
        matches!(
            self,
            Reason::InsufficientPermissions
                | Reason::AuthenticationRequired
                | Reason::PublicEndpoint
                | Reason::UnknownGateway
                | Reason::PolicyEvaluationError
                | Reason::NoMatchingPolicy
        )
    }

    /// Reasons an allow may carry.
    pub fn is_allow_reason(self) -> bool {
        matches!(
            self,
            Reason::AdminFullAccess | Reason::PublicEndpoint | Reason::PolicyAllowed
        )
    }

    /// Interpret a reason reported by the engine. Text that is blank, unknown,
    /// or does not fit the outcome falls back to `allowed by policy` /
    /// `no matching policy`.
    pub fn from_engine(text: &str, allow: bool) -> Reason {
        match (Reason::parse(text), allow) {
            (Some(r), true) if r.is_allow_reason() => r,
            (Some(r), false) if r.is_deny_reason() => r,
            (_, true) => Reason::PolicyAllowed,
            (_, false) => Reason::NoMatchingPolicy,
        }
    }
}

impl TryFrom<String> for Reason {
    type Error = PolicyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Reason::parse(&s).ok_or_else(|| PolicyError::Decode(format!("unknown reason: {s:?}")))
    }
}

impl From<Reason> for String {
    fn from(r: Reason) -> Self {
        r.as_str().to_string()
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
