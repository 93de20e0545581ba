//! Cell value coercion.
//!
//! Exported reports are noisy: thousands separators, units, placeholder
//! dashes. Every coercion here degrades to a default instead of failing and
//! records the anomaly in the per-file [`ParseStats`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error_handling::{ParseStats, RowAnomaly};

/// Placeholder exporters write for "no date".
const NO_DATE: &str = "-";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y", "%b %d, %Y"];

/// Parses a numeric cell.
///
/// Every character other than ASCII digits and `.` is stripped first, so
/// "1,234", "$12" and "45 %" all parse. Parsing then takes the longest
/// leading run with at most one decimal point. Absent, empty and unparseable
/// cells yield `0.0`; the result is never negative and never NaN.
pub fn parse_number(raw: Option<&str>, stats: &mut ParseStats) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };

    let mut digits = String::with_capacity(raw.len());
    let mut seen_point = false;
    for c in raw.chars() {
        match c {
            '0'..='9' => digits.push(c),
            '.' if !seen_point => {
                seen_point = true;
                digits.push(c);
            }
            '.' => break,
            _ => {}
        }
    }

    match digits.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            if !raw.trim().is_empty() {
                stats.increment(RowAnomaly::UnparseableNumber);
            }
            0.0
        }
    }
}

/// Parses an integer count cell with the same leniency as [`parse_number`],
/// truncating any fractional part.
pub fn parse_count(raw: Option<&str>, stats: &mut ParseStats) -> u64 {
    parse_number(raw, stats).trunc() as u64
}

/// Parses a date or date-time cell as UTC.
///
/// Absent cells, empty cells and the `-` placeholder are `None` without
/// comment; anything else that matches no known layout is `None` and counted.
pub fn parse_date(raw: Option<&str>, stats: &mut ParseStats) -> Option<DateTime<Utc>> {
    let value = raw?.trim();
    if value.is_empty() || value == NO_DATE {
        return None;
    }

    let parsed = try_parse_date(value);
    if parsed.is_none() {
        stats.increment(RowAnomaly::UnparseableDate);
    }
    parsed
}

fn try_parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// A boolean flag column is set only when its value is literally `true`,
/// ignoring case.
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| v.to_lowercase() == "true")
}

/// Free-text cells: empty becomes `None`.
pub fn parse_text(raw: Option<&str>) -> Option<String> {
    raw.filter(|v| !v.is_empty()).map(str::to_string)
}
