//! Delivery of submission documents to the Kobo API.
//!
//! - **transport**: the [`Transport`] seam and its blocking `reqwest` implementation
//! - **retry**: backoff policy for transient failures
//! - **client**: headers, retry loop and outcome classification
//! - **delivery**: per-row outcomes and the run's [`FailureLog`]
//! - **failure_log**: CSV persistence of failures

pub mod client;
pub mod delivery;
pub mod error;
pub mod failure_log;
pub mod retry;
pub mod transport;

pub use reqwest::header::HeaderMap;

pub use client::{SUCCESS_STATUS, SubmissionClient, submission_headers};
pub use delivery::{DeliveryOutcome, FailureLog};
pub use error::{Result, SubmitError};
pub use failure_log::write_failure_log;
pub use retry::{DEFAULT_STATUS_FORCELIST, RetryPolicy};
pub use transport::{HttpReply, ReqwestTransport, Transport};
