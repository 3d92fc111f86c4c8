//! Error types for tabular source loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a source table.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Source file not found.
    #[error("source file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The file extension is not a supported tabular format.
    #[error("unsupported table format '{extension}' for {path} (use .csv, .tsv or .xlsx)")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A text table in an encoding other than UTF-8.
    #[error("{path} is encoded as {encoding}; save it as UTF-8")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    /// A text table with bytes that are not valid UTF-8.
    #[error("{path} is not valid UTF-8 (line {line}); save it as \"CSV UTF-8\"")]
    InvalidUtf8 { path: PathBuf, line: usize },

    /// Failed to parse the file with Polars.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// One or more required columns are absent.
    #[error("missing column(s) {} in {path}", columns.join(", "))]
    MissingColumns { columns: Vec<String>, path: PathBuf },
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
