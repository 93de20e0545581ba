//! Error handling and parse statistics.
//!
//! This module provides:
//! - Error type definitions for initialization, storage, parsing and imports
//! - Row-anomaly statistics for the silently recovered problems in exported reports
//!
//! Fatal errors (a file that cannot be decoded, a failed storage write) are
//! propagated. Row-level anomalies are counted and the row is dropped or the
//! field defaulted; they are only ever visible in debug logs.

mod stats;
mod types;

// Re-export public API
pub use stats::ParseStats;
pub use types::{DatabaseError, ImportError, InitializationError, ParseError, RowAnomaly};
