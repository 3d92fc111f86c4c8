//! CLI argument definitions for the Kobo submission loader.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "kobo-loader",
    version,
    about = "Submit tabular survey data to a KoboToolbox server",
    long_about = "Submit tabular survey data to a KoboToolbox server.\n\n\
                  Each row of the parent table becomes one submission; rows of the\n\
                  configured child tables become its repeat groups."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the JSON run configuration.
    #[arg(
        long = "config",
        value_name = "PATH",
        default_value = "config/config.json",
        global = true
    )]
    pub config: PathBuf,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write `submit` logs to this file instead of stderr. The file is overwritten on each run.
    #[arg(
        long = "log-file",
        value_name = "PATH",
        default_value = "logs/app.log",
        global = true
    )]
    pub log_file: PathBuf,

    /// Log to stderr instead of the log file.
    #[arg(long = "no-log-file", global = true)]
    pub no_log_file: bool,

    /// Allow respondent data (payload bodies) in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

impl Cli {
    /// Log file for this invocation, or `None` for stderr.
    ///
    /// Only `submit` writes the file; `preview` must not truncate the log of
    /// the last submission run.
    pub fn log_file_path(&self) -> Option<&Path> {
        match self.command {
            Command::Submit(_) if !self.no_log_file => Some(&self.log_file),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Build and submit one record per parent row.
    Submit(SubmitArgs),

    /// Print the payload for one parent row without sending it.
    Preview(PreviewArgs),
}

#[derive(Args)]
pub struct SubmitArgs {
    /// API token, overriding the one in the config file.
    #[arg(long = "api-token", env = "KOBO_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Where failed submissions are recorded.
    #[arg(
        long = "failure-log",
        value_name = "PATH",
        default_value = "logs/failed_logs.csv"
    )]
    pub failure_log: PathBuf,

    /// Only submit the first N parent rows.
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,

    /// Hide the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Args)]
pub struct PreviewArgs {
    /// Zero-based parent row to preview.
    #[arg(long = "row", value_name = "N", default_value_t = 0)]
    pub row: usize,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
