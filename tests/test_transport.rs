//! Tests for the retrying transport: retry budget, rejection, timeouts and text decoding

use std::time::Duration;

mod test_util;
use gitlab_insight::gitlab::{HostResponse, Transport, TransportError, TransportPolicy};
use gitlab_insight::types::RemoteCall;
use test_util::{FlakyHost, RejectingHost, fast_policy};

/// k failures below the budget followed by success yields the success
#[tokio::test]
async fn test_transient_failures_then_success() {
    let host = FlakyHost::new(2, br#"{"id": 42, "name": "demo"}"#);
    let transport = Transport::new(host.clone(), fast_policy(3));

    let response = transport
        .call(&RemoteCall::get("/api/v4/projects/42"))
        .await
        .expect("call should succeed on the third attempt");

    assert_eq!(
        response,
        HostResponse::Json(serde_json::json!({"id": 42, "name": "demo"}))
    );
    assert_eq!(host.attempts(), 3, "no attempts after the first success");
}

#[tokio::test]
async fn test_first_attempt_success_does_not_retry() {
    let host = FlakyHost::new(0, b"[]");
    let transport = Transport::new(host.clone(), fast_policy(3));

    transport
        .call(&RemoteCall::get("/api/v4/projects/42/repository/tree"))
        .await
        .unwrap();

    assert_eq!(host.attempts(), 1);
}

/// Exhausting the budget surfaces an error naming the endpoint and attempt count
#[tokio::test]
async fn test_budget_exhausted_names_endpoint() {
    let host = FlakyHost::new(usize::MAX, b"never");
    let transport = Transport::new(host.clone(), fast_policy(3));

    let error = transport
        .call(&RemoteCall::get("/api/v4/projects/42/pipelines"))
        .await
        .unwrap_err();

    match &error {
        TransportError::Exhausted {
            endpoint,
            attempts,
            last_error,
        } => {
            assert_eq!(endpoint, "GET /api/v4/projects/42/pipelines");
            assert_eq!(*attempts, 3);
            assert!(last_error.contains("attempt 3"));
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
    assert_eq!(host.attempts(), 3);

    let message = error.to_string();
    assert!(message.contains("3 attempts"), "message: {}", message);
    assert!(message.contains("/api/v4/projects/42/pipelines"), "message: {}", message);
}

#[tokio::test]
async fn test_zero_attempt_budget_still_tries_once() {
    let host = FlakyHost::new(0, b"{}");
    let transport = Transport::new(host.clone(), fast_policy(0));

    assert!(transport.call(&RemoteCall::get("/api/v4/version")).await.is_ok());
    assert_eq!(host.attempts(), 1);
}

/// Host rejections such as 404 are not network faults and are not retried
#[tokio::test]
async fn test_rejection_is_not_retried() {
    let host = RejectingHost::default();
    let transport = Transport::new(host.clone(), fast_policy(5));

    let error = transport
        .call(&RemoteCall::get("/api/v4/projects/missing"))
        .await
        .unwrap_err();

    assert!(matches!(error, TransportError::Rejected { .. }));
    assert_eq!(error.endpoint(), "GET /api/v4/projects/missing");
    assert_eq!(host.attempts(), 1);
}

/// A hanging attempt is cut off by the per-attempt timeout and retried
#[tokio::test]
async fn test_slow_attempt_times_out_and_retries() {
    let host = FlakyHost::hanging(1, Duration::from_secs(10), b"{\"ok\": true}");
    let policy = TransportPolicy {
        max_attempts: 2,
        backoff: Duration::ZERO,
        attempt_timeout: Duration::from_millis(50),
    };
    let transport = Transport::new(host.clone(), policy);

    let response = transport
        .call(&RemoteCall::get("/api/v4/projects/42"))
        .await
        .expect("second attempt should answer");

    assert_eq!(response.into_json()["ok"], serde_json::json!(true));
    assert_eq!(host.attempts(), 2);
}

/// Bytes that are invalid UTF-8 but valid Latin-1 decode without error
#[tokio::test]
async fn test_latin1_body_is_decoded() {
    let host = FlakyHost::new(0, b"Build caf\xe9 finished\n");
    let transport = Transport::new(host, fast_policy(1));

    let text = transport
        .call_text(&RemoteCall::get("/api/v4/projects/42/jobs/7/trace"))
        .await
        .unwrap();

    assert_eq!(text, "Build café finished\n");
}

/// A text body that happens to parse as JSON is not reformatted
#[tokio::test]
async fn test_call_text_keeps_json_looking_body_verbatim() {
    let log = "[1,    2]\n";
    let host = FlakyHost::new(0, log.as_bytes());
    let transport = Transport::new(host, fast_policy(1));

    let text = transport
        .call_text(&RemoteCall::get("/api/v4/projects/42/jobs/7/trace"))
        .await
        .unwrap();

    assert_eq!(text, log);
}

#[tokio::test]
async fn test_plain_text_body_passes_through() {
    let log = "$ cargo build\n   Compiling demo v0.1.0\nerror[E0308]: mismatched types\n";
    let host = FlakyHost::new(0, log.as_bytes());
    let transport = Transport::new(host, fast_policy(1));

    let response = transport
        .call(&RemoteCall::get("/api/v4/projects/42/jobs/7/trace"))
        .await
        .unwrap();

    assert_eq!(response, HostResponse::Text(log.to_string()));
}

#[tokio::test]
async fn test_call_json_reports_unexpected_payload() {
    let host = FlakyHost::new(0, b"<html>maintenance</html>");
    let transport = Transport::new(host, fast_policy(1));

    let error = transport
        .call_json::<Vec<serde_json::Value>>(&RemoteCall::get("/api/v4/projects/42/repository/tree"))
        .await
        .unwrap_err();

    match error {
        TransportError::UnexpectedPayload { endpoint, reason } => {
            assert_eq!(endpoint, "GET /api/v4/projects/42/repository/tree");
            assert!(reason.contains("maintenance"));
        }
        other => panic!("expected UnexpectedPayload, got {:?}", other),
    }
}

fn backoff_policy(max_attempts: u32) -> TransportPolicy {
    TransportPolicy {
        max_attempts,
        backoff: Duration::from_secs(2),
        attempt_timeout: Duration::from_secs(20),
    }
}

/// Each retry waits the fixed backoff first
#[tokio::test(start_paused = true)]
async fn test_backoff_waits_between_attempts() {
    let host = FlakyHost::new(2, b"{}");
    let transport = Transport::new(host.clone(), backoff_policy(3));

    let started = tokio::time::Instant::now();
    transport
        .call(&RemoteCall::get("/api/v4/projects/42"))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(host.attempts(), 3);
    assert!(elapsed >= Duration::from_secs(4), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "elapsed {:?}", elapsed);
}

/// The budget ends without a wait after the last attempt
#[tokio::test(start_paused = true)]
async fn test_no_backoff_after_final_attempt() {
    let host = FlakyHost::new(usize::MAX, b"never");
    let transport = Transport::new(host.clone(), backoff_policy(3));

    let started = tokio::time::Instant::now();
    let error = transport
        .call(&RemoteCall::get("/api/v4/projects/42"))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(error, TransportError::Exhausted { attempts: 3, .. }));
    assert!(elapsed >= Duration::from_secs(4), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(6), "two waits, not three: {:?}", elapsed);
}
