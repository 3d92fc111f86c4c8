use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required value is absent or empty.
    #[error("missing required config value '{0}'")]
    MissingValue(&'static str),

    #[error("config value '{key}' is invalid: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
