//! Polars AnyValue utility functions.
//!
//! Every value that ends up in a submission passes through [`any_to_string`],
//! so the rules here define what a cell looks like on the wire.

use polars::prelude::{AnyValue, DataFrame};

/// Returns true for the table's missing sentinels: null and floating NaN.
pub fn is_missing(value: &AnyValue<'_>) -> bool {
    match value {
        AnyValue::Null => true,
        AnyValue::Float32(v) => v.is_nan(),
        AnyValue::Float64(v) => v.is_nan(),
        _ => false,
    }
}

/// Converts a Polars AnyValue to its canonical string form.
///
/// Missing values become the empty string. The conversion never fails, and
/// applying it to its own output returns the same string.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    if is_missing(&value) {
        return String::new();
    }
    match value {
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => v.to_string(),
        AnyValue::Float64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => if b { "True" } else { "False" }.to_string(),
        other => other.to_string(),
    }
}

/// Converts AnyValue to String, returning None for missing values.
pub fn any_to_string_non_missing(value: AnyValue<'_>) -> Option<String> {
    if is_missing(&value) {
        None
    } else {
        Some(any_to_string(value))
    }
}

/// Get a cell from a DataFrame, treating absent columns or rows as missing.
pub fn column_value<'a>(df: &'a DataFrame, name: &str, idx: usize) -> AnyValue<'a> {
    df.column(name)
        .ok()
        .and_then(|column| column.get(idx).ok())
        .unwrap_or(AnyValue::Null)
}

/// Names from `required` that are not columns of `df`, in the given order.
pub fn missing_columns<'a, I>(df: &DataFrame, required: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut missing: Vec<String> = Vec::new();
    for name in required {
        if df.column(name).is_err() && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }
    missing
}
