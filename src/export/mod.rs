//! Read-side exports of stored snapshots.
//!
//! This module loads a site's latest snapshot and writes its referring-domain
//! rollup as CSV.

mod csv;
mod queries;

pub use csv::{export_domains_csv, write_domains_csv};
pub use queries::{load_latest_snapshot, LatestSnapshot};
