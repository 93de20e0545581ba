//! Container decoders.
//!
//! Each supported container is decoded into the same [`DecodedTable`]: the
//! header row plus the remaining rows as strings. Nothing here knows about
//! backlinks; column meaning is resolved later by `fields`.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;

use crate::error_handling::ParseError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Delimiters tried when sniffing a delimited file, in preference order.
const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b'\t', b';'];

/// A decoded table: header names and the data rows beneath them.
///
/// Rows may be shorter or longer than the header; missing trailing cells are
/// simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Decodes delimited text (CSV/TSV).
///
/// Accepts UTF-8 (with or without BOM) and BOM-marked UTF-16 text. The
/// delimiter is sniffed from the header line. Blank rows are skipped.
pub fn decode_delimited(bytes: &[u8], file: &str) -> Result<DecodedTable, ParseError> {
    let text = decode_text(bytes, file)?;
    let delimiter = sniff_delimiter(text.lines().next().unwrap_or_default());

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| malformed(file, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ParseError::MissingHeader {
            file: file.to_string(),
        });
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| malformed(file, e))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(DecodedTable { headers, rows })
}

/// Decodes the first worksheet of a spreadsheet workbook (xlsx, xlsm, xls, ods).
pub fn decode_spreadsheet(bytes: &[u8], file: &str) -> Result<DecodedTable, ParseError> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| malformed(file, e))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => return Err(malformed(file, e)),
        None => {
            return Err(ParseError::MissingHeader {
                file: file.to_string(),
            })
        }
    };

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(cells) => cells.iter().map(cell_to_string).collect(),
        None => Vec::new(),
    };
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ParseError::MissingHeader {
            file: file.to_string(),
        });
    }

    let rows = sheet_rows
        .map(|cells| cells.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .collect();

    Ok(DecodedTable { headers, rows })
}

fn malformed(file: &str, reason: impl std::fmt::Display) -> ParseError {
    ParseError::MalformedFile {
        file: file.to_string(),
        reason: reason.to_string(),
    }
}

/// Turns raw bytes into text, honouring a UTF-8 or UTF-16 byte order mark.
fn decode_text(bytes: &[u8], file: &str) -> Result<String, ParseError> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return String::from_utf8(rest.to_vec()).map_err(|e| malformed(file, e));
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, file, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, file, u16::from_be_bytes);
    }
    String::from_utf8(bytes.to_vec()).map_err(|e| malformed(file, e))
}

fn decode_utf16(
    bytes: &[u8],
    file: &str,
    to_unit: fn([u8; 2]) -> u16,
) -> Result<String, ParseError> {
    if bytes.len() % 2 != 0 {
        return Err(malformed(file, "truncated UTF-16 text"));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| malformed(file, e))
}

/// Picks the candidate delimiter occurring most often in the header line.
fn sniff_delimiter(header_line: &str) -> u8 {
    let mut best = CANDIDATE_DELIMITERS[0];
    let mut best_count = 0;
    for candidate in CANDIDATE_DELIMITERS {
        let count = header_line.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Bool(b) => b.to_string(),
        Data::Int(i) => i.to_string(),
        // Whole numbers print without a trailing ".0" so they read like the CSV export
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_delimited_basic() {
        let csv = "Referring page URL,DR\nhttps://a.example/x,12\n";
        let table = decode_delimited(csv.as_bytes(), "t.csv").unwrap();
        assert_eq!(table.headers, vec!["Referring page URL", "DR"]);
        assert_eq!(table.rows, vec![vec!["https://a.example/x", "12"]]);
    }

    #[test]
    fn test_decode_delimited_strips_utf8_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"Referring page URL,DR\nhttps://a.example/x,12\n");
        let table = decode_delimited(&bytes, "t.csv").unwrap();
        assert_eq!(table.headers[0], "Referring page URL");
    }

    #[test]
    fn test_decode_delimited_utf16_le_tab_separated() {
        let text = "Referring page URL\tDR\r\nhttps://a.example/x\t12\r\n";
        let mut bytes = UTF16_LE_BOM.to_vec();
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let table = decode_delimited(&bytes, "t.csv").unwrap();
        assert_eq!(table.headers, vec!["Referring page URL", "DR"]);
        assert_eq!(table.rows, vec![vec!["https://a.example/x", "12"]]);
    }

    #[test]
    fn test_decode_delimited_semicolon() {
        let csv = "Referring page URL;DR\nhttps://a.example/x;12\n";
        let table = decode_delimited(csv.as_bytes(), "t.csv").unwrap();
        assert_eq!(table.headers.len(), 2);
        assert_eq!(table.rows[0][1], "12");
    }

    #[test]
    fn test_decode_delimited_skips_blank_rows_and_tolerates_ragged_rows() {
        let csv = "A,B,C\n1,2,3\n,,\n\n4,5\n6,7,8,9\n";
        let table = decode_delimited(csv.as_bytes(), "t.csv").unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1], vec!["4", "5"]);
        assert_eq!(table.rows[2].len(), 4);
    }

    #[test]
    fn test_decode_delimited_invalid_utf8_is_malformed() {
        let bytes = [b'A', b',', 0xC3, 0x28, b'\n'];
        let err = decode_delimited(&bytes, "bad.csv").unwrap_err();
        assert!(matches!(err, ParseError::MalformedFile { .. }));
    }

    #[test]
    fn test_decode_delimited_empty_file_has_no_header() {
        let err = decode_delimited(b"", "empty.csv").unwrap_err();
        assert!(matches!(err, ParseError::MissingHeader { .. }));
    }

    #[test]
    fn test_decode_spreadsheet_garbage_is_malformed() {
        let err = decode_spreadsheet(b"definitely not a workbook", "x.xlsx").unwrap_err();
        assert!(matches!(err, ParseError::MalformedFile { .. }));
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a,b,c"), b',');
        assert_eq!(sniff_delimiter("a\tb\tc"), b'\t');
        assert_eq!(sniff_delimiter("a;b;c"), b';');
        assert_eq!(sniff_delimiter("single"), b',');
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(62.0)), "62");
        assert_eq!(cell_to_string(&Data::Float(4.9)), "4.9");
        assert_eq!(cell_to_string(&Data::Bool(true)), "true");
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("x".into())), "x");
    }
}
