//! Error type definitions.
//!
//! This module defines the fatal error types used throughout the application
//! and the row anomalies that are recovered from silently.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be mapped back onto the domain model.
    #[error("Corrupt stored value in {column}: {value}")]
    CorruptValue { column: &'static str, value: String },
}

/// Fatal, per-file parse failures.
///
/// A report either yields a complete record set or fails with one of these;
/// there is no partial result.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The file could not be read from disk.
    #[error("Failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// The container could not be decoded (corrupt spreadsheet, bad encoding, broken quoting).
    #[error("Parse failed for {file}: {reason}")]
    MalformedFile { file: String, reason: String },

    /// The file decoded but carries no header row to name its columns.
    #[error("Parse failed for {file}: no header row")]
    MissingHeader { file: String },

    /// The file extension names no supported report container.
    #[error("Unsupported report format for {file}")]
    UnsupportedFormat { file: String },
}

/// Failure of one file within an import.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The report could not be parsed; nothing was written for it.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A storage write failed while persisting the report.
    #[error("Failed to store {file}: {source}")]
    Storage {
        file: String,
        #[source]
        source: DatabaseError,
    },
}

/// Row-level problems in an exported report.
///
/// These never abort a parse: the row is dropped (`MissingSourceUrl`,
/// `EmptyDomain`) or the field falls back to its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum RowAnomaly {
    MissingSourceUrl,
    EmptyDomain,
    UnparseableNumber,
    UnparseableDate,
}

impl std::fmt::Display for RowAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RowAnomaly {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowAnomaly::MissingSourceUrl => "Missing referring page URL",
            RowAnomaly::EmptyDomain => "Empty referring domain",
            RowAnomaly::UnparseableNumber => "Unparseable numeric field",
            RowAnomaly::UnparseableDate => "Unparseable date field",
        }
    }

    /// Whether this anomaly causes the whole row to be discarded.
    pub fn drops_row(&self) -> bool {
        matches!(self, RowAnomaly::MissingSourceUrl | RowAnomaly::EmptyDomain)
    }
}
