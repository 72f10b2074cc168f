//! Network-backed evaluator against a mock policy engine.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use mockito::{Matcher, Server};
use serde_json::json;

use policygate_core::{PolicyError, PolicyRequest, RateLimitRequest, RateLimits, Reason};
use policygate_server::evaluator::opa::MAX_ERROR_BODY;
use policygate_server::{OpaEvaluator, PolicyEvaluator};

fn admin_request() -> PolicyRequest {
    PolicyRequest::new("admin-gateway", "/admin/api/v1/users", "GET")
        .with_user("admin-001", &["admin"])
}

#[tokio::test]
async fn access_posts_input_and_reads_result() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/data/admin_gateway/rbac")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "input": {
                "user": { "user_id": "admin-001", "roles": ["admin"] },
                "request": {
                    "resource": "/admin/api/v1/users",
                    "action": "GET",
                    "gateway": "admin-gateway"
                }
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result":{"allow":true,"reason":"admin role permits all admin operations"}}"#)
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let out = ev.evaluate_access(&admin_request()).await;

    mock.assert_async().await;
    assert!(out.is_ok());
    let d = out.value();
    assert!(d.allow);
    assert_eq!(d.reason, Reason::AdminFullAccess);
    assert_eq!(d.policy_id.as_deref(), Some("admin_gateway/rbac"));
    assert!(!d.is_degraded());
}

#[tokio::test]
async fn unrecognized_engine_reason_maps_to_closed_set() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/data/public_gateway/anonymous_access")
        .with_status(200)
        .with_body(r#"{"result":{"allow":false,"reason":"lol whatever"}}"#)
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let req = PolicyRequest::new("public-gateway", "/api/v1/patients", "GET");
    let d = ev.evaluate_access(&req).await.into_value();
    assert!(!d.allow);
    assert_eq!(d.reason, Reason::NoMatchingPolicy);
    assert_eq!(d.metadata["engine_reason"], json!("lol whatever"));
    assert_eq!(d.policy_id.as_deref(), Some("public_gateway/anonymous_access"));
    assert!(!d.is_degraded());

    let wire = serde_json::to_value(&d).unwrap();
    assert_eq!(wire["reason"], "no matching policy");
}

#[tokio::test]
async fn recognized_engine_reason_adds_no_metadata() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/data/public_gateway/anonymous_access")
        .with_status(200)
        .with_body(r#"{"result":{"allow":false,"reason":"authentication required"}}"#)
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let req = PolicyRequest::new("public-gateway", "/api/v1/patients", "GET");
    let d = ev.evaluate_access(&req).await.into_value();
    assert_eq!(d.reason, Reason::AuthenticationRequired);
    assert!(d.metadata.get("engine_reason").is_none());
}

#[tokio::test]
async fn unknown_gateway_sends_nothing() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let req = PolicyRequest::new("partner-gateway", "/admin/x", "GET");
    let (d, err) = ev.evaluate_access(&req).await.into_parts();
    assert!(!d.allow);
    assert_eq!(d.reason, Reason::UnknownGateway);
    assert_eq!(err, Some(PolicyError::UnknownGateway("partner-gateway".into())));

    let (limits, err) = ev
        .evaluate_rate_limit(&RateLimitRequest::new("partner-gateway"))
        .await
        .into_parts();
    assert!(limits.is_deny_all());
    assert!(matches!(err, Some(PolicyError::UnknownGateway(_))));

    mock.assert_async().await;
}

#[tokio::test]
async fn non_200_is_a_protocol_error_with_body() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/data/admin_gateway/rbac")
        .with_status(500)
        .with_body("policy compile failed")
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let (d, err) = ev.evaluate_access(&admin_request()).await.into_parts();
    assert!(!d.allow);
    assert_eq!(d.reason, Reason::PolicyEvaluationError);
    let err = err.expect("error expected");
    assert_eq!(err.class().as_str(), "PROTOCOL");
    assert_eq!(
        err,
        PolicyError::Status { status: 500, body: "policy compile failed".into() }
    );
}

#[tokio::test]
async fn malformed_envelope_still_denies() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/data/admin_gateway/rbac")
        .with_status(200)
        .with_body("<html>proxy error</html>")
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let (d, err) = ev.evaluate_access(&admin_request()).await.into_parts();
    assert!(!d.allow);
    assert_eq!(d.reason, Reason::PolicyEvaluationError);
    assert!(matches!(err, Some(PolicyError::Decode(_))));
}

#[tokio::test]
async fn empty_result_is_degraded_deny() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/data/admin_gateway/rbac")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let out = ev.evaluate_access(&admin_request()).await;
    assert!(out.is_ok());
    let d = out.value();
    assert!(!d.allow);
    assert_eq!(d.reason, Reason::NoMatchingPolicy);
    assert!(d.is_degraded());
    assert_eq!(d.metadata["missing_fields"], json!(["allow", "reason"]));
}

#[tokio::test]
async fn mistyped_allow_never_grants() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/data/admin_gateway/rbac")
        .with_status(200)
        .with_body(r#"{"result":{"allow":"true","reason":"ok"}}"#)
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let d = ev.evaluate_access(&admin_request()).await.into_value();
    assert!(!d.allow);
    assert_eq!(d.reason, Reason::NoMatchingPolicy);
    assert_eq!(d.metadata["engine_reason"], json!("ok"));
    assert_eq!(d.metadata["missing_fields"], json!(["allow"]));
}

#[tokio::test]
async fn rate_limits_accept_float_numbers() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/data/public_gateway/rate_limit")
        .match_body(Matcher::PartialJson(json!({
            "input": { "request": { "gateway": "public-gateway", "client_ip": "203.0.113.9" } }
        })))
        .with_status(200)
        .with_body(r#"{"result":{"requests_per_window":1000.0,"time_window_seconds":60}}"#)
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let mut req = RateLimitRequest::new("public-gateway");
    req.client_ip = "203.0.113.9".into();
    let out = ev.evaluate_rate_limit(&req).await;

    mock.assert_async().await;
    assert!(out.is_ok());
    assert_eq!(out.value(), &RateLimits::new(1000, Duration::from_secs(60)));
}

#[tokio::test]
async fn rate_limits_missing_or_negative_fields_degrade_to_zero() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/data/admin_gateway/rate_limit")
        .with_status(200)
        .with_body(r#"{"result":{"requests_per_window":-5}}"#)
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let limits = ev
        .evaluate_rate_limit(&RateLimitRequest::new("admin-gateway"))
        .await
        .into_value();
    assert_eq!(limits.requests_per_window, 0);
    assert_eq!(limits.time_window, Duration::ZERO);
    assert!(limits.degraded);
    assert!(limits.is_deny_all());
}

#[tokio::test]
async fn rate_limits_fractional_or_huge_numbers_degrade_to_zero() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/data/admin_gateway/rate_limit")
        .with_status(200)
        .with_body(r#"{"result":{"requests_per_window":1e300,"time_window_seconds":0.5}}"#)
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let out = ev
        .evaluate_rate_limit(&RateLimitRequest::new("admin-gateway"))
        .await;
    assert!(out.is_ok());
    let limits = out.into_value();
    assert_eq!(limits.requests_per_window, 0);
    assert_eq!(limits.time_window, Duration::ZERO);
    assert!(limits.degraded);
    assert!(limits.is_deny_all());
}

#[tokio::test]
async fn oversized_error_body_is_truncated() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/data/admin_gateway/rbac")
        .with_status(500)
        .with_body("e".repeat(10_000))
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let (d, err) = ev.evaluate_access(&admin_request()).await.into_parts();
    assert_eq!(d.reason, Reason::PolicyEvaluationError);
    let Some(PolicyError::Status { status, body }) = err else {
        panic!("status error expected");
    };
    assert_eq!(status, 500);
    assert!(body.starts_with(&"e".repeat(MAX_ERROR_BODY)));
    assert!(body.ends_with(&format!("({} bytes truncated)", 10_000 - MAX_ERROR_BODY)));
}

#[tokio::test]
async fn rate_limit_engine_failure_is_zero_budget() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/data/admin_gateway/rate_limit")
        .with_status(503)
        .create_async()
        .await;

    let ev = OpaEvaluator::new(server.url()).unwrap();
    let (limits, err) = ev
        .evaluate_rate_limit(&RateLimitRequest::new("admin-gateway"))
        .await
        .into_parts();
    assert_eq!(limits, RateLimits::deny_all());
    assert!(matches!(err, Some(PolicyError::Status { status: 503, .. })));
}

/// Accepts connections and never answers.
async fn silent_engine() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn configured_timeout_yields_deny() {
    let ev = OpaEvaluator::new(silent_engine().await)
        .unwrap()
        .with_timeout(Duration::from_millis(150));

    let started = Instant::now();
    let (d, err) = ev.evaluate_access(&admin_request()).await.into_parts();
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!d.allow);
    assert_eq!(d.reason, Reason::PolicyEvaluationError);
    assert_eq!(err, Some(PolicyError::Timeout(Duration::from_millis(150))));
}

#[tokio::test]
async fn per_call_timeout_overrides_default() {
    let ev = OpaEvaluator::new(silent_engine().await).unwrap();
    let started = Instant::now();
    let out = ev
        .evaluate_rate_limit_within(&RateLimitRequest::new("admin-gateway"), Duration::from_millis(100))
        .await;
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(out.error(), Some(&PolicyError::Timeout(Duration::from_millis(100))));
    assert!(out.value().is_deny_all());
}

#[tokio::test]
async fn dropping_the_future_cancels_promptly() {
    let ev = OpaEvaluator::new(silent_engine().await).unwrap();
    let req = admin_request();
    let started = Instant::now();
    let res = tokio::time::timeout(Duration::from_millis(100), ev.evaluate_access(&req)).await;
    assert!(res.is_err());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn unreachable_engine_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let ev = OpaEvaluator::new(format!("http://{addr}")).unwrap();
    let (d, err) = ev.evaluate_access(&admin_request()).await.into_parts();
    assert!(!d.allow);
    assert_eq!(err.map(|e| e.class().as_str()), Some("TRANSPORT"));
}

#[tokio::test]
async fn concurrent_identical_calls_agree() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/data/admin_gateway/rbac")
        .with_status(200)
        .with_body(r#"{"result":{"allow":true,"reason":"admin role permits all admin operations"}}"#)
        .expect(16)
        .create_async()
        .await;

    let ev = Arc::new(OpaEvaluator::new(server.url()).unwrap());
    let mut tasks = Vec::new();
    for _ in 0..16 {
        let ev = Arc::clone(&ev);
        tasks.push(tokio::spawn(async move {
            ev.evaluate_access(&admin_request()).await.into_result().unwrap()
        }));
    }
    let mut decisions = Vec::new();
    for t in tasks {
        decisions.push(t.await.unwrap());
    }
    mock.assert_async().await;
    assert!(decisions.windows(2).all(|w| w[0] == w[1]));
}
