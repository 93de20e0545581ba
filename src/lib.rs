//! backlink_intel library: backlink report ingestion and analysis
//!
//! This library turns exported backlink reports (Ahrefs, SEMrush and similar
//! CSV or spreadsheet exports) into canonical records stored as immutable
//! snapshots in SQLite, and derives from them:
//! - per-snapshot summary metrics
//! - a daily or cumulative discovery trend of referring domains
//! - a per-referring-domain rollup with a spam-risk classification
//! - an outreach library of referring domains, synced create-if-missing
//!
//! # Example
//!
//! ```no_run
//! use backlink_intel::{run_import, Config, ImportOptions};
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     db_path: PathBuf::from("intel.db"),
//!     ..Default::default()
//! };
//! let files = vec![PathBuf::from("example.com-backlinks-subdomains.csv")];
//!
//! let report = run_import(&config, &files, &ImportOptions::default()).await?;
//! println!("Imported {} records", report.total_records());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! Storage and file reads are async. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within a Tokio runtime.

pub mod config;
mod domain;
mod error_handling;
pub mod export;
mod import;
pub mod initialization;
pub mod library;
mod metrics;
mod models;
pub mod parse;
mod rollup;
pub mod storage;
mod trend;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use domain::{extract_referring_domain, normalize_domain};
pub use error_handling::{
    DatabaseError, ImportError, InitializationError, ParseError, ParseStats, RowAnomaly,
};
pub use import::{
    import_file, run_import, site_host_from_file_name, FileImport, ImportOptions, ImportReport,
};
pub use library::{Catalog, InsertOutcome, LibraryDomain};
pub use metrics::{compute_metrics, MetricsAccumulator};
pub use models::{BacklinkRecord, Site, Snapshot, SnapshotMetrics};
pub use parse::{parse_file, parse_report, ParseResult, ReportFormat};
pub use rollup::{classify, rollup, sort_by_authority, DomainSummary, RiskClass};
pub use trend::{build_trend, build_trend_now, TrendMode, TrendPoint, TrendRange};
