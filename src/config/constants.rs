//! Configuration constants.
//!
//! This module defines the defaults and thresholds used throughout the
//! application.

// constants (used as defaults)
pub const DB_PATH: &str = "./backlink_intel.db";

// Import batching
/// Records written per storage transaction during an import.
/// Bounds the work of each write and gives regular progress logging.
pub const DEFAULT_BATCH_SIZE: usize = 2000;
/// Rows per multi-row `INSERT` statement.
/// 17 bound columns per backlink row keeps a statement well under SQLite's
/// 32766 host-parameter limit.
pub const SQLITE_MAX_ROWS_PER_STATEMENT: usize = 400;

// Spam heuristic
/// A referring page with more outbound links than this looks like a link farm
pub const LINK_FARM_EXTERNAL_LINKS: u64 = 400;
/// Authority scores below this are low-trust
pub const LOW_TRUST_AUTHORITY: f64 = 5.0;

// Library defaults
pub const DEFAULT_CURRENCY: &str = "USD";
/// Maximum number of domains shown in the export-to-library preview
pub const EXPORT_PREVIEW_LIMIT: usize = 100;

// Site resolution
/// Host used when neither the caller nor the file name names one
pub const UNKNOWN_SITE_HOST: &str = "unknown-site";
/// Exporters name files `<host>-backlinks-<mode>.<ext>`
pub const FILE_NAME_HOST_MARKER: &str = "-backlinks";

// Trend windows
pub const DEFAULT_TREND_RANGE_DAYS: u32 = 180;
/// Window presets offered by the CLI, in days
pub const TREND_RANGE_PRESETS: &[u32] = &[30, 90, 180, 365];
