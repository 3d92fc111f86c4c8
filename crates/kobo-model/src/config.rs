//! Run configuration loaded from the JSON config file.
//!
//! The file layout matches the one used by the field teams:
//!
//! ```json
//! {
//!   "parent_data_path": "data/households.csv",
//!   "repeat_groups": {
//!     "members": { "data_path": "data/members.csv", "fields": { "name": "Name" } }
//!   },
//!   "project_uuid": "...",
//!   "formhub_uuid": "...",
//!   "formhub_version": "...",
//!   "api_token_UNHCR_PROD": "..."
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};

/// Endpoint used when the config does not name one.
pub const DEFAULT_API_ENDPOINT: &str = "https://kobocat.unhcr.org/api/v1/submissions";

/// HTTP request timeout used when the config does not name one.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Top-level configuration for a submission run.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionConfig {
    /// Path to the parent (one row per submission) table.
    pub parent_data_path: PathBuf,

    /// Nested repeat-group layout. Key order is preserved.
    #[serde(default)]
    pub repeat_groups: Option<Map<String, Value>>,

    /// Legacy single child table, used only when `repeat_groups` is absent.
    #[serde(default)]
    pub child_data_path: Option<PathBuf>,

    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    pub project_uuid: String,

    pub formhub_uuid: String,

    #[serde(rename = "formhub_version")]
    pub form_version: String,

    #[serde(default, rename = "api_token_UNHCR_PROD", alias = "api_token")]
    pub api_token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Where the repeat-group tree comes from.
#[derive(Debug, Clone, Copy)]
pub enum GroupSource<'a> {
    /// A `repeat_groups` tree from the config file.
    Configured(&'a Map<String, Value>),
    /// The legacy single child table with the fixed Name/Age/Gender mapping.
    Legacy(&'a Path),
}

/// Submission-level values shared by every payload in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionMeta {
    pub project_uuid: String,
    pub formhub_uuid: String,
    pub form_version: String,
}

impl SubmissionConfig {
    /// Parse a config from a JSON string and validate it.
    pub fn from_json_str(path: &Path, contents: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the configured API token when an override is given.
    #[must_use]
    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token {
            self.api_token = Some(token);
        }
        self
    }

    /// The API token, which must be present and non-empty.
    pub fn api_token(&self) -> Result<&str> {
        match self.api_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ConfigError::MissingValue("api_token_UNHCR_PROD")),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn meta(&self) -> SubmissionMeta {
        SubmissionMeta {
            project_uuid: self.project_uuid.clone(),
            formhub_uuid: self.formhub_uuid.clone(),
            form_version: self.form_version.clone(),
        }
    }

    /// Repeat groups take precedence; the legacy child table is the fallback.
    pub fn group_source(&self) -> Result<GroupSource<'_>> {
        if let Some(groups) = &self.repeat_groups {
            return Ok(GroupSource::Configured(groups));
        }
        match &self.child_data_path {
            Some(path) => Ok(GroupSource::Legacy(path)),
            None => Err(ConfigError::MissingValue("child_data_path")),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.parent_data_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingValue("parent_data_path"));
        }
        if self.project_uuid.trim().is_empty() {
            return Err(ConfigError::MissingValue("project_uuid"));
        }
        if self.formhub_uuid.trim().is_empty() {
            return Err(ConfigError::MissingValue("formhub_uuid"));
        }
        if !(self.api_endpoint.starts_with("https://") || self.api_endpoint.starts_with("http://"))
        {
            return Err(ConfigError::InvalidValue {
                key: "api_endpoint",
                reason: format!("expected an http(s) URL, got '{}'", self.api_endpoint),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.group_source()?;
        Ok(())
    }
}

/// Load and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<SubmissionConfig> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    SubmissionConfig::from_json_str(path, &contents)
}
