//! Backlink report parsing.
//!
//! Turns an exported report (delimited text or a spreadsheet) into canonical
//! [`BacklinkRecord`]s plus the snapshot metrics for the whole file:
//! - `decode` - one decoder per container format, all producing a `DecodedTable`
//! - `fields` - alias table and tolerant header lookup
//! - `values` - lenient number/date/flag coercion
//! - `record` - row → record construction
//!
//! A file either parses completely or fails with a single [`ParseError`];
//! malformed rows inside an otherwise readable file are dropped silently.

mod decode;
mod fields;
mod record;
mod values;

use std::path::Path;

use log::{debug, info};

use crate::error_handling::{ParseError, ParseStats};
use crate::metrics::MetricsAccumulator;
use crate::models::{BacklinkRecord, SnapshotMetrics};

// Re-export public API
pub use decode::{decode_delimited, decode_spreadsheet, DecodedTable};
pub use fields::{Field, RawRow};
pub use record::build_record;
pub use values::{parse_count, parse_date, parse_flag, parse_number, parse_text};

/// Container format of a report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// CSV / TSV text export
    Delimited,
    /// Workbook export; only the first sheet is read
    Spreadsheet,
}

impl ReportFormat {
    /// Chooses a format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(ReportFormat::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(ReportFormat::Spreadsheet),
            _ => None,
        }
    }

    fn decode(&self, bytes: &[u8], file: &str) -> Result<DecodedTable, ParseError> {
        match self {
            ReportFormat::Delimited => decode_delimited(bytes, file),
            ReportFormat::Spreadsheet => decode_spreadsheet(bytes, file),
        }
    }
}

/// Output of parsing one report.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub records: Vec<BacklinkRecord>,
    pub metrics: SnapshotMetrics,
    /// Header row exactly as exported
    pub field_names: Vec<String>,
    pub stats: ParseStats,
}

/// Parses report bytes of a known format.
///
/// `file` is only used to label errors and log lines.
///
/// # Errors
///
/// Returns a [`ParseError`] when the container itself cannot be decoded.
pub fn parse_report(
    bytes: &[u8],
    format: ReportFormat,
    file: &str,
) -> Result<ParseResult, ParseError> {
    let table = format.decode(bytes, file)?;

    let mut stats = ParseStats::new();
    let mut metrics = MetricsAccumulator::new();
    let mut records = Vec::with_capacity(table.rows.len());

    for values in &table.rows {
        let row = RawRow::new(&table.headers, values);
        if let Some(record) = build_record(&row, &mut stats) {
            metrics.observe(&record);
            records.push(record);
        }
    }

    let metrics = metrics.finish();
    debug!(
        "Parsed {} of {} rows from {} ({} dropped)",
        records.len(),
        table.rows.len(),
        file,
        stats.dropped_rows()
    );
    stats.log_summary(file);

    Ok(ParseResult {
        records,
        metrics,
        field_names: table.headers,
        stats,
    })
}

/// Reads and parses a report file, choosing the format from its extension.
///
/// # Errors
///
/// Returns [`ParseError::UnsupportedFormat`] for unknown extensions,
/// [`ParseError::Io`] when the file cannot be read, or the decoding error.
pub async fn parse_file(path: &Path) -> Result<ParseResult, ParseError> {
    let file = display_name(path);
    let format = ReportFormat::from_path(path).ok_or_else(|| ParseError::UnsupportedFormat {
        file: file.clone(),
    })?;

    let bytes = tokio::fs::read(path).await.map_err(|source| ParseError::Io {
        file: file.clone(),
        source,
    })?;

    info!("Parsing {} ({} bytes, {:?})", file, bytes.len(), format);
    parse_report(&bytes, format, &file)
}

/// File name used in messages and as a snapshot's source file name.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
