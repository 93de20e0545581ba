//! Canonical data model shared by the parser, aggregators and storage.
//!
//! Everything downstream of `parse` works on these typed records only; the
//! loosely-shaped exporter rows never leave the parser.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One referring-page → target-page link discovered in a single snapshot.
///
/// Immutable once constructed. `referring_domain` is never empty: rows whose
/// source URL does not yield a domain are dropped during parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacklinkRecord {
    /// Referring page URL, raw as exported
    pub source_page_url: String,
    /// Canonical domain derived from `source_page_url`
    pub referring_domain: String,
    pub target_url: String,
    pub first_discovered_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub anchor_text: Option<String>,
    pub is_nofollow: bool,
    pub is_ugc: bool,
    pub is_sponsored: bool,
    /// Vendor authority score (DR / Authority Score). Never negative, never NaN.
    pub domain_authority_score: f64,
    /// Page-level rating (UR), defaults to 0
    pub url_rating: f64,
    pub domain_traffic: f64,
    pub page_traffic: f64,
    pub external_link_count: u64,
    pub language: Option<String>,
}

impl BacklinkRecord {
    /// A dofollow link passes ranking signal; it is simply a link not marked nofollow.
    pub fn is_dofollow(&self) -> bool {
        !self.is_nofollow
    }
}

/// Aggregate statistics for one parsed report.
///
/// Invariant: the dofollow totals never exceed their overall counterparts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotMetrics {
    pub total_links: u64,
    pub total_referring_domains: u64,
    pub total_dofollow_links: u64,
    pub total_dofollow_referring_domains: u64,
    pub earliest_first_seen: Option<DateTime<Utc>>,
    pub latest_first_seen: Option<DateTime<Utc>>,
}

/// A tracked website whose backlink reports are imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    /// Lower-cased host, matched case-insensitively on import
    pub canonical_host: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One completed import of one report for one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub id: String,
    pub site_id: String,
    pub source_file_name: String,
    pub imported_at: DateTime<Utc>,
    pub data_cutoff_at: Option<DateTime<Utc>>,
    pub record_count: u64,
    pub notes: Option<String>,
    pub metrics: SnapshotMetrics,
}

/// Converts an optional timestamp to milliseconds since the Unix epoch.
pub(crate) fn to_millis(ts: Option<&DateTime<Utc>>) -> Option<i64> {
    ts.map(|t| t.timestamp_millis())
}

/// Converts milliseconds since the Unix epoch back to a UTC timestamp.
pub(crate) fn from_millis(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.and_then(DateTime::<Utc>::from_timestamp_millis)
}
