//! Failure log persistence.

use std::fs;
use std::path::Path;

use kobo_model::FailureRecord;
use tracing::info;

use crate::error::{Result, SubmitError};

/// Write failures as CSV with `Row`, `Status_Code` and `Response` columns.
///
/// Missing parent directories are created. Network failures leave
/// `Status_Code` empty.
pub fn write_failure_log(path: &Path, records: &[FailureRecord]) -> Result<()> {
    let failure = |message: String| SubmitError::FailureLog {
        path: path.to_path_buf(),
        message,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| failure(e.to_string()))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| failure(e.to_string()))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| failure(e.to_string()))?;
    }
    writer.flush().map_err(|e| failure(e.to_string()))?;

    info!(path = %path.display(), failures = records.len(), "saved failure log");
    Ok(())
}
