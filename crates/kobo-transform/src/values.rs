//! Cell value rendering for submission payloads.
//!
//! Two rules apply to every emitted field:
//!
//! - [`safe_str`]: missing values become `""`, anything else its canonical
//!   string form.
//! - [`format_date`]: fields declared as dates render as `YYYY-MM-DD`, or `""`
//!   when missing or unparseable.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::{AnyValue, TimeUnit};
use tracing::error;

use kobo_ingest::{any_to_string, is_missing};

/// Days from 0001-01-01 (CE) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Date-only layouts, tried in order. Month-first wins for ambiguous
/// slash dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Render a cell as a payload string. Never fails.
pub fn safe_str(value: AnyValue<'_>) -> String {
    any_to_string(value)
}

/// Render a cell as `YYYY-MM-DD`.
///
/// Missing values give `""`. Values that are not calendar dates are logged
/// and also give `""`.
pub fn format_date(value: AnyValue<'_>) -> String {
    if is_missing(&value) {
        return String::new();
    }
    match value_to_date(&value) {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(reason) => {
            error!(value = %any_to_string(value), "error formatting date: {reason}");
            String::new()
        }
    }
}

/// Parse text as a calendar date, accepting plain dates, common day/month
/// layouts and ISO 8601 datetimes (the time part is dropped).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                .map(|datetime| datetime.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|datetime| datetime.date_naive())
        })?;
    in_calendar_range(parsed)
}

fn value_to_date(value: &AnyValue<'_>) -> Result<NaiveDate, String> {
    let date = match value {
        AnyValue::String(text) => parse_date(text),
        AnyValue::StringOwned(text) => parse_date(text.as_str()),
        AnyValue::Date(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .and_then(in_calendar_range),
        AnyValue::Datetime(ticks, unit, _) | AnyValue::DatetimeOwned(ticks, unit, _) => {
            datetime_from_ticks(*ticks, *unit).and_then(in_calendar_range)
        }
        other => return Err(format!("{} is not a date value", other.dtype())),
    };
    date.ok_or_else(|| "unrecognised date".to_string())
}

fn datetime_from_ticks(ticks: i64, unit: TimeUnit) -> Option<NaiveDate> {
    let datetime = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(ticks)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(ticks),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(ticks),
    };
    datetime.map(|datetime| datetime.date_naive())
}

/// Four-digit years only, so rendered dates are always ten characters.
fn in_calendar_range(date: NaiveDate) -> Option<NaiveDate> {
    (1..=9999).contains(&date.year()).then_some(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date("2024-01-15"), expected);
        assert_eq!(parse_date(" 2024/01/15 "), expected);
        assert_eq!(parse_date("01/15/2024"), expected);
        assert_eq!(parse_date("15/01/2024"), expected);
        assert_eq!(parse_date("15 Jan 2024"), expected);
        assert_eq!(parse_date("January 15, 2024"), expected);
        assert_eq!(parse_date("2024-01-15 10:30:00"), expected);
        assert_eq!(parse_date("2024-01-15T10:30:00.250"), expected);
        assert_eq!(parse_date("2024-01-15T10:30:00+03:00"), expected);
    }

    #[test]
    fn rejects_non_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("12345"), None);
    }

    #[test]
    fn formats_typed_dates() {
        // 2024-01-15 is 19737 days after the Unix epoch.
        assert_eq!(format_date(AnyValue::Date(19_737)), "2024-01-15");
        assert_eq!(
            format_date(AnyValue::Datetime(
                1_705_314_600_000,
                TimeUnit::Milliseconds,
                None
            )),
            "2024-01-15"
        );
    }

    #[test]
    fn missing_and_invalid_dates_are_empty() {
        assert_eq!(format_date(AnyValue::Null), "");
        assert_eq!(format_date(AnyValue::String("soon")), "");
        assert_eq!(format_date(AnyValue::Int64(20_240_115)), "");
        assert_eq!(format_date(AnyValue::String("2024-01-15")), "2024-01-15");
    }
}
