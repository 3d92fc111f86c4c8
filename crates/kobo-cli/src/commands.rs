use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use kobo_ingest::FileTableLoader;
use kobo_model::load_config;
use kobo_submit::{ReqwestTransport, SubmissionClient};

use kobo_cli::pipeline::{SubmitOptions, load_inputs, save_failures, submit_rows};

use crate::cli::{PreviewArgs, SubmitArgs};
use crate::types::RunSummary;

pub fn run_submit(config_path: &Path, args: &SubmitArgs, show_progress: bool) -> Result<RunSummary> {
    let span = info_span!("submit", config = %config_path.display());
    let _guard = span.enter();

    let config = load_config(config_path)
        .with_context(|| format!("load config {}", config_path.display()))?
        .with_api_token(args.api_token.clone());
    let token = config.api_token()?;

    let inputs = load_inputs(&config, &FileTableLoader)?;

    let transport = ReqwestTransport::new(config.request_timeout())?;
    let client = SubmissionClient::new(transport, config.api_endpoint.as_str(), token)?;
    let options = SubmitOptions {
        limit: args.limit,
        show_progress,
    };
    let report = submit_rows(&inputs, &client, options);

    let mut errors = Vec::new();
    let failure_log = save_failures(&report.failures, &args.failure_log, &mut errors);
    if report.all_succeeded() {
        info!(rows = report.rows, "all submissions succeeded");
    }

    Ok(RunSummary {
        config: config_path.to_path_buf(),
        endpoint: config.api_endpoint.clone(),
        rows: report.rows,
        succeeded: report.succeeded,
        failed: report.failed(),
        issues: inputs.issues.iter().map(ToString::to_string).collect(),
        failure_log,
        errors,
    })
}

pub fn run_preview(config_path: &Path, args: &PreviewArgs) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;
    let inputs = load_inputs(&config, &FileTableLoader)?;
    for issue in &inputs.issues {
        eprintln!("warning: repeat group skipped: {issue}");
    }
    if args.row >= inputs.row_count() {
        bail!(
            "row {} is out of range: the parent table has {} row(s)",
            args.row,
            inputs.row_count()
        );
    }

    let payload = inputs.payload(args.row);
    let rendered = serde_json::to_string_pretty(&payload).context("render payload")?;
    println!("{rendered}");
    Ok(())
}
