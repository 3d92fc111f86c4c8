//! Spreadsheet-style source reading.
//!
//! Tables are read with every column as text. Identifiers such as `ID` and
//! `Parent_ID` are then compared exactly as written in the file, and empty
//! cells come back as nulls.

use std::fs;
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use polars::prelude::{
    CsvParseOptions, CsvReadOptions, DataFrame, IntoColumn, NamedFrom, PolarsError, PolarsResult,
    SerReader, Series,
};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Supported on-disk table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    /// Excel or OpenDocument workbook; the first sheet is read.
    Workbook,
}

impl TableFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
            _ => Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Read a source table into a DataFrame of text columns.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let format = TableFormat::from_path(path)?;
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = match format {
        TableFormat::Csv => read_delimited(path, b',')?,
        TableFormat::Tsv => read_delimited(path, b'\t')?,
        TableFormat::Workbook => read_workbook(path)?,
    };

    debug!(
        path = %path.display(),
        ?format,
        rows = df.height(),
        columns = df.width(),
        "loaded table"
    );
    Ok(df)
}

/// Read a table and check that it carries the given columns.
pub fn read_table_with_columns(path: &Path, required: &[&str]) -> Result<DataFrame> {
    let df = read_table(path)?;
    let missing = crate::polars_utils::missing_columns(&df, required.iter().copied());
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            columns: missing,
            path: path.to_path_buf(),
        });
    }
    Ok(df)
}

/// Check that a text table is UTF-8 (a UTF-8 BOM is fine).
///
/// UTF-16 files are rejected by their BOM. Anything else that does not decode
/// is rejected with the line of the first invalid byte.
pub fn validate_encoding(path: &Path) -> Result<()> {
    let bytes = fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    // UTF-16 LE / BE
    for (bom, encoding) in [([0xFF, 0xFE], "UTF-16 LE"), ([0xFE, 0xFF], "UTF-16 BE")] {
        if bytes.starts_with(&bom) {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding,
            });
        }
    }

    if let Err(e) = std::str::from_utf8(&bytes) {
        let line = bytes[..e.valid_up_to()]
            .iter()
            .filter(|&&byte| byte == b'\n')
            .count()
            + 1;
        return Err(IngestError::InvalidUtf8 {
            path: path.to_path_buf(),
            line,
        });
    }
    Ok(())
}

fn read_delimited(path: &Path, separator: u8) -> Result<DataFrame> {
    validate_encoding(path)?;

    let parse_error = |e: PolarsError| IngestError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options: CsvParseOptions| options.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(parse_error)?
        .finish()
        .map_err(parse_error)
}

fn read_workbook(path: &Path) -> Result<DataFrame> {
    let parse_error = |message: String| IngestError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| parse_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| parse_error("workbook has no sheets".to_string()))?
        .map_err(|e| parse_error(e.to_string()))?;
    sheet_to_frame(&range).map_err(|e| parse_error(e.to_string()))
}

/// The first row names the columns; every other cell becomes text.
fn sheet_to_frame(range: &Range<Data>) -> PolarsResult<DataFrame> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };

    let mut values: Vec<Vec<Option<String>>> =
        vec![Vec::with_capacity(range.height().saturating_sub(1)); header.len()];
    for row in rows {
        for (column, cell) in values.iter_mut().zip(row) {
            column.push(cell_to_string(cell));
        }
    }

    let columns = header
        .iter()
        .enumerate()
        .zip(values)
        .map(|((idx, name), values)| {
            let name = cell_to_string(name).unwrap_or_else(|| format!("Unnamed: {idx}"));
            Series::new(name.into(), values).into_column()
        })
        .collect();
    DataFrame::new(columns)
}

/// Empty and error cells are nulls. Whole numbers lose their `.0`.
fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Bool(flag) => Some(if *flag { "True" } else { "False" }.to_string()),
        Data::String(text) if text.is_empty() => None,
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            Some(text.clone())
        }
        Data::DateTime(value) => Some(serial_to_text(value.as_f64())),
        other => Some(other.to_string()),
    }
}

/// Render an Excel serial date (days since 1899-12-30) as ISO text.
fn serial_to_text(serial: f64) -> String {
    let datetime = NaiveDate::from_ymd_opt(1899, 12, 30)
        .map(|epoch| epoch.and_time(NaiveTime::MIN))
        .zip(TimeDelta::try_milliseconds((serial * 86_400_000.0).round() as i64))
        .and_then(|(epoch, offset)| epoch.checked_add_signed(offset));
    match datetime {
        Some(datetime) if datetime.time() == NaiveTime::MIN => {
            datetime.format("%Y-%m-%d").to_string()
        }
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => serial.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polars_utils::{any_to_string, column_value};

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(
            TableFormat::from_path(Path::new("a/b.CSV")).unwrap(),
            TableFormat::Csv
        );
        assert_eq!(
            TableFormat::from_path(Path::new("b.tsv")).unwrap(),
            TableFormat::Tsv
        );
        assert_eq!(
            TableFormat::from_path(Path::new("households.xlsx")).unwrap(),
            TableFormat::Workbook
        );
        let err = TableFormat::from_path(Path::new("households.json")).unwrap_err();
        assert!(matches!(
            err,
            IngestError::UnsupportedFormat { ref extension, .. } if extension == "json"
        ));
    }

    #[test]
    fn sheet_cells_become_text() {
        let mut range = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("ID".to_string()));
        range.set_value((0, 1), Data::String("Age".to_string()));
        // (0, 2) is left empty.
        range.set_value((1, 0), Data::String("P001".to_string()));
        range.set_value((1, 1), Data::Float(7.0));
        range.set_value((1, 2), Data::Float(2.5));
        range.set_value((2, 0), Data::Int(1002));
        range.set_value((2, 2), Data::Bool(true));

        let df = sheet_to_frame(&range).unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, ["ID", "Age", "Unnamed: 2"]);
        let text = |column: &str, row: usize| any_to_string(column_value(&df, column, row));
        assert_eq!(text("ID", 0), "P001");
        assert_eq!(text("ID", 1), "1002");
        assert_eq!(text("Age", 0), "7");
        assert!(column_value(&df, "Age", 1).is_null());
        assert_eq!(text("Unnamed: 2", 0), "2.5");
        assert_eq!(text("Unnamed: 2", 1), "True");
    }

    #[test]
    fn empty_sheet_gives_empty_frame() {
        let range: Range<Data> = Range::empty();
        let df = sheet_to_frame(&range).unwrap();
        assert_eq!(df.width(), 0);
    }

    #[test]
    fn serial_dates_render_as_iso_text() {
        assert_eq!(serial_to_text(45_366.0), "2024-03-15");
        assert_eq!(serial_to_text(45_366.5), "2024-03-15 12:00:00");
        assert_eq!(serial_to_text(1.0), "1899-12-31");
    }
}
