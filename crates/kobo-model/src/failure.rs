use serde::Serialize;

/// A parent row whose submission did not end in `201 Created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    /// Zero-based parent row index.
    #[serde(rename = "Row")]
    pub row: usize,
    /// HTTP status, absent when no response was received.
    #[serde(rename = "Status_Code")]
    pub status_code: Option<u16>,
    /// Response body, or the error text for network failures.
    #[serde(rename = "Response")]
    pub response: String,
}

impl FailureRecord {
    pub fn network(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            status_code: None,
            response: message.into(),
        }
    }

    pub fn status(row: usize, status_code: u16, body: impl Into<String>) -> Self {
        Self {
            row,
            status_code: Some(status_code),
            response: body.into(),
        }
    }

    pub fn is_network_failure(&self) -> bool {
        self.status_code.is_none()
    }
}
