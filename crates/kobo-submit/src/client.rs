//! Submission client: headers, retries and outcome classification.

use std::thread;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::delivery::DeliveryOutcome;
use crate::error::{Result, SubmitError};
use crate::retry::RetryPolicy;
use crate::transport::{HttpReply, Transport};

/// Status the submission API answers with when a record is stored.
pub const SUCCESS_STATUS: u16 = 201;

/// Posts submissions to one endpoint with a fixed token.
#[derive(Debug, Clone)]
pub struct SubmissionClient<T> {
    transport: T,
    endpoint: String,
    headers: HeaderMap,
    policy: RetryPolicy,
}

/// Build the `Authorization: Token <token>` and JSON content-type headers.
pub fn submission_headers(token: &str) -> Result<HeaderMap> {
    let mut auth = HeaderValue::from_str(&format!("Token {token}"))
        .map_err(|e| SubmitError::InvalidToken(e.to_string()))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

impl<T: Transport> SubmissionClient<T> {
    pub fn new(transport: T, endpoint: impl Into<String>, token: &str) -> Result<Self> {
        Ok(Self {
            transport,
            endpoint: endpoint.into(),
            headers: submission_headers(token)?,
            policy: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `payload`, retrying transient failures.
    ///
    /// Returns the last response or error once retries are exhausted.
    pub fn send(&self, payload: &Value) -> Result<HttpReply> {
        let mut retries = 0;
        loop {
            let result = self
                .transport
                .post_json(&self.endpoint, &self.headers, payload);

            let retryable = match &result {
                Ok(reply) => self.policy.is_retryable_status(reply.status),
                Err(err) => err.is_network(),
            };
            if !retryable || retries >= self.policy.max_retries {
                if retries > 0 {
                    debug!(retries, "request finished after retries");
                }
                return result;
            }

            retries += 1;
            let delay = self.policy.backoff_for(retries);
            match &result {
                Ok(reply) => warn!(
                    status = reply.status,
                    retry = retries,
                    max_retries = self.policy.max_retries,
                    "transient server error, retrying in {delay:?}"
                ),
                Err(err) => warn!(
                    error = %err,
                    retry = retries,
                    max_retries = self.policy.max_retries,
                    "request failed, retrying in {delay:?}"
                ),
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }

    /// Send one parent row's payload and classify the result.
    pub fn deliver(&self, row: usize, payload: &Value) -> DeliveryOutcome {
        let outcome = DeliveryOutcome::from_result(self.send(payload));
        match &outcome {
            DeliveryOutcome::Success => info!(row, "submission succeeded"),
            DeliveryOutcome::NetworkFailure { message } => {
                error!(row, error = %message, "submission failed");
            }
            DeliveryOutcome::StatusFailure { status, body } => {
                error!(row, status, response = %body, "submission rejected");
            }
        }
        outcome
    }
}
