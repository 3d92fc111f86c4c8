//! Tabular source loading for survey submissions.
//!
//! - **reader**: CSV/TSV files and workbooks into text-typed Polars DataFrames
//! - **loader**: the [`TableLoader`] seam used by repeat-group resolution
//! - **polars_utils**: AnyValue conversions shared by payload building

pub mod error;
pub mod loader;
pub mod polars_utils;
pub mod reader;

pub use error::{IngestError, Result};
pub use loader::{FileTableLoader, TableLoader};
pub use polars_utils::{
    any_to_string, any_to_string_non_missing, column_value, is_missing, missing_columns,
};
pub use reader::{TableFormat, read_table, read_table_with_columns, validate_encoding};
