//! HTTP transport seam.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, SubmitError};

/// Status and body of a received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one JSON POST request. Implementations do not retry.
///
/// `Err` means no response was received, and is always
/// [`SubmitError::Network`].
pub trait Transport {
    fn post_json(&self, endpoint: &str, headers: &HeaderMap, body: &Value) -> Result<HttpReply>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post_json(&self, endpoint: &str, headers: &HeaderMap, body: &Value) -> Result<HttpReply> {
        (**self).post_json(endpoint, headers, body)
    }
}

/// Blocking `reqwest` transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kobo-loader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SubmitError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn post_json(&self, endpoint: &str, headers: &HeaderMap, body: &Value) -> Result<HttpReply> {
        let response = self
            .client
            .post(endpoint)
            .headers(headers.clone())
            .json(body)
            .send()?;

        let status = response.status().as_u16();
        let body = response.text().unwrap_or_else(|e| {
            warn!(status, error = %e, "failed to read response body");
            String::new()
        });
        Ok(HttpReply { status, body })
    }
}
