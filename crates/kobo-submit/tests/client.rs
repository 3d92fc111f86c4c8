//! Tests for retrying delivery and failure logging.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;

use kobo_model::FailureRecord;
use kobo_submit::{
    DeliveryOutcome, FailureLog, HttpReply, Result, RetryPolicy, SubmissionClient, SubmitError,
    Transport, write_failure_log,
};
use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde_json::{Value, json};

/// Replays canned replies and records every request it sees.
#[derive(Default)]
struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<HttpReply>>>,
    requests: RefCell<Vec<(String, Option<String>, Value)>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Result<HttpReply>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            requests: RefCell::default(),
        }
    }

    fn calls(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn post_json(&self, endpoint: &str, headers: &HeaderMap, body: &Value) -> Result<HttpReply> {
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.requests
            .borrow_mut()
            .push((endpoint.to_string(), auth, body.clone()));
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(SubmitError::Network("script exhausted".to_string())))
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::default().with_backoff_factor(0.0)
}

fn client(transport: &ScriptedTransport) -> SubmissionClient<&ScriptedTransport> {
    SubmissionClient::new(transport, "https://kobo.example.org/api/v1/submissions", "tok")
        .expect("client")
        .with_retry_policy(fast_policy())
}

#[test]
fn retries_transient_error_then_succeeds() {
    let transport = ScriptedTransport::new(vec![
        Ok(HttpReply::new(503, "busy")),
        Ok(HttpReply::new(201, "{}")),
    ]);
    let payload = json!({"id": "proj"});

    let outcome = client(&transport).deliver(0, &payload);
    assert_eq!(outcome, DeliveryOutcome::Success);
    assert_eq!(transport.calls(), 2);

    let requests = transport.requests.borrow();
    let (endpoint, auth, body) = &requests[1];
    assert_eq!(endpoint, "https://kobo.example.org/api/v1/submissions");
    assert_eq!(auth.as_deref(), Some("Token tok"));
    assert_eq!(body, &payload);

    let mut log = FailureLog::new();
    assert!(log.record(0, outcome));
    assert!(log.is_empty());
}

#[test]
fn persistent_network_error_gives_one_failure() {
    let replies = (0..6)
        .map(|_| Err(SubmitError::Network("connection refused".to_string())))
        .collect();
    let transport = ScriptedTransport::new(replies);

    let outcome = client(&transport).deliver(4, &json!({}));
    assert_eq!(transport.calls(), 6);

    let mut log = FailureLog::new();
    assert!(!log.record(4, outcome));
    assert_eq!(log.len(), 1);
    let failure = &log.records()[0];
    assert_eq!(failure.row, 4);
    assert_eq!(failure.status_code, None);
    assert!(!failure.response.is_empty());
}

#[test]
fn exhausted_server_errors_return_last_response() {
    let replies = (0..6).map(|i| Ok(HttpReply::new(502, format!("attempt {i}")))).collect();
    let transport = ScriptedTransport::new(replies);

    let reply = client(&transport).send(&json!({})).expect("reply");
    assert_eq!(transport.calls(), 6);
    assert_eq!(reply, HttpReply::new(502, "attempt 5"));
}

#[test]
fn client_errors_are_not_retried() {
    let transport = ScriptedTransport::new(vec![Ok(HttpReply::new(400, "bad payload"))]);

    let outcome = client(&transport).deliver(2, &json!({}));
    assert_eq!(transport.calls(), 1);
    assert_eq!(
        outcome.into_failure(2),
        Some(FailureRecord::status(2, 400, "bad payload"))
    );
}

#[test]
fn retries_can_be_disabled() {
    let transport = ScriptedTransport::new(vec![
        Ok(HttpReply::new(500, "boom")),
        Ok(HttpReply::new(201, "")),
    ]);
    let client = SubmissionClient::new(&transport, "http://localhost/", "tok")
        .expect("client")
        .with_retry_policy(RetryPolicy::none());

    assert!(!client.deliver(0, &json!({})).is_success());
    assert_eq!(transport.calls(), 1);
}

#[test]
fn failure_log_is_written_as_csv() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("logs").join("failed_logs.csv");
    let records = vec![
        FailureRecord::network(1, "timed out"),
        FailureRecord::status(3, 400, "{\"error\": \"bad, very bad\"}"),
    ];

    write_failure_log(&path, &records).expect("write log");

    let contents = fs::read_to_string(&path).expect("read log");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "Row,Status_Code,Response");
    assert_eq!(lines[1], "1,,timed out");
    assert_eq!(lines[2], r#"3,400,"{""error"": ""bad, very bad""}""#);
}
