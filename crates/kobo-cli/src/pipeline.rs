//! Load, build and deliver: the stages of a submission run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::DataFrame;
use serde_json::Value;
use tracing::{debug, error, info, info_span, trace};

use kobo_ingest::{TableLoader, missing_columns};
use kobo_model::{FAMILY_ID_COLUMN, GroupSource, ID_COLUMN, SubmissionConfig, SubmissionMeta};
use kobo_submit::{FailureLog, SubmissionClient, Transport, write_failure_log};
use kobo_transform::{
    ParentRecord, ResolveIssue, ResolvedGroups, create_payload, resolve_legacy_group,
    resolve_repeat_groups,
};

use crate::logging::{log_data_enabled, redact_value};

/// Everything a run needs before the first request is sent.
#[derive(Debug)]
pub struct RunInputs {
    pub parent: DataFrame,
    pub groups: ResolvedGroups,
    /// Repeat groups dropped during resolution.
    pub issues: Vec<ResolveIssue>,
    pub meta: SubmissionMeta,
}

impl RunInputs {
    pub fn row_count(&self) -> usize {
        self.parent.height()
    }

    /// The submission document for parent row `row`.
    pub fn payload(&self, row: usize) -> Value {
        let parent = ParentRecord::from_row(&self.parent, row);
        create_payload(&parent, &self.groups, &self.meta)
    }
}

/// Load the parent table and resolve repeat groups.
///
/// A parent table that cannot be loaded, or that lacks `ID`/`Family_ID`, is
/// fatal. So is a legacy child table that cannot be loaded. Problems with
/// configured repeat groups are not: they are returned in
/// [`RunInputs::issues`].
pub fn load_inputs<L>(config: &SubmissionConfig, loader: &L) -> Result<RunInputs>
where
    L: TableLoader + ?Sized,
{
    let span = info_span!("load", parent = %config.parent_data_path.display());
    let _guard = span.enter();

    let parent = loader
        .load(&config.parent_data_path)
        .context("failed to load parent data")?;
    let missing = missing_columns(&parent, [ID_COLUMN, FAMILY_ID_COLUMN]);
    if !missing.is_empty() {
        bail!(
            "parent data {} is missing column(s): {}",
            config.parent_data_path.display(),
            missing.join(", ")
        );
    }

    let (groups, issues) = match config.group_source()? {
        GroupSource::Configured(tree) => {
            let resolution = resolve_repeat_groups(tree, loader);
            (resolution.groups, resolution.issues)
        }
        GroupSource::Legacy(path) => {
            let groups = resolve_legacy_group(path, loader).context("failed to load child data")?;
            (groups, Vec::new())
        }
    };

    info!(
        rows = parent.height(),
        groups = groups.leaf_count(),
        issues = issues.len(),
        "inputs loaded"
    );
    Ok(RunInputs {
        parent,
        groups,
        issues,
        meta: config.meta(),
    })
}

/// Options for [`submit_rows`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitOptions {
    /// Only submit the first `limit` parent rows.
    pub limit: Option<usize>,
    pub show_progress: bool,
}

/// Counts and failures of a finished run.
#[derive(Debug, Default)]
pub struct SubmitReport {
    pub rows: usize,
    pub succeeded: usize,
    pub failures: FailureLog,
}

impl SubmitReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build and deliver one payload per parent row, in table order.
///
/// A failing row never stops the run.
pub fn submit_rows<T: Transport>(
    inputs: &RunInputs,
    client: &SubmissionClient<T>,
    options: SubmitOptions,
) -> SubmitReport {
    let rows = options
        .limit
        .map_or(inputs.row_count(), |limit| limit.min(inputs.row_count()));
    let progress = progress_bar(rows, options.show_progress);
    let mut report = SubmitReport {
        rows,
        ..SubmitReport::default()
    };

    info!(rows, endpoint = client.endpoint(), "submitting records");
    for row in 0..rows {
        let payload = inputs.payload(row);
        let rendered = if log_data_enabled() {
            payload.to_string()
        } else {
            String::new()
        };
        trace!(row, payload = redact_value(&rendered), "built payload");

        let outcome = client.deliver(row, &payload);
        if report.failures.record(row, outcome) {
            report.succeeded += 1;
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    info!(
        rows,
        succeeded = report.succeeded,
        failed = report.failed(),
        "submission run finished"
    );
    report
}

/// Write the failure log when there is anything to write.
///
/// Returns the path written, or `None` when every row succeeded.
pub fn persist_failures(failures: &FailureLog, path: &Path) -> Result<Option<PathBuf>> {
    if failures.is_empty() {
        debug!("no failures to save");
        return Ok(None);
    }
    write_failure_log(path, failures.records())?;
    Ok(Some(path.to_path_buf()))
}

/// [`persist_failures`] for the end of a run: a log that cannot be written
/// is reported and its message pushed to `errors`, and the run carries on.
pub fn save_failures(
    failures: &FailureLog,
    path: &Path,
    errors: &mut Vec<String>,
) -> Option<PathBuf> {
    match persist_failures(failures, path) {
        Ok(written) => written,
        Err(e) => {
            error!(error = %e, "failed to save failure log");
            errors.push(format!("{e:#}"));
            None
        }
    }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    match ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}] {pos}/{len} ({eta})") {
        Ok(style) => bar.set_style(style.progress_chars("█▓░")),
        Err(e) => debug!(error = %e, "invalid progress template"),
    }
    bar.set_message("Submitting records");
    bar
}
