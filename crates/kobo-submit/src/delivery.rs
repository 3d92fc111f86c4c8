//! Per-row delivery outcomes and failure bookkeeping.

use kobo_model::FailureRecord;

use crate::client::SUCCESS_STATUS;
use crate::error::Result;
use crate::transport::HttpReply;

/// How one submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The API answered `201 Created`.
    Success,
    /// No response was received after retries.
    NetworkFailure { message: String },
    /// The API answered with any status other than `201`.
    StatusFailure { status: u16, body: String },
}

impl DeliveryOutcome {
    pub fn from_result(result: Result<HttpReply>) -> Self {
        match result {
            Ok(reply) if reply.status == SUCCESS_STATUS => Self::Success,
            Ok(HttpReply { status, body }) => Self::StatusFailure { status, body },
            Err(err) => Self::NetworkFailure {
                message: err.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The failure record for `row`, or `None` on success.
    pub fn into_failure(self, row: usize) -> Option<FailureRecord> {
        match self {
            Self::Success => None,
            Self::NetworkFailure { message } => Some(FailureRecord::network(row, message)),
            Self::StatusFailure { status, body } => Some(FailureRecord::status(row, status, body)),
        }
    }
}

/// Failures collected over a run, in row order.
#[derive(Debug, Clone, Default)]
pub struct FailureLog {
    records: Vec<FailureRecord>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `outcome` for `row`. Returns whether it was a success.
    pub fn record(&mut self, row: usize, outcome: DeliveryOutcome) -> bool {
        match outcome.into_failure(row) {
            Some(failure) => {
                self.records.push(failure);
                false
            }
            None => true,
        }
    }

    pub fn records(&self) -> &[FailureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
