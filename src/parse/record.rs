//! Canonical record construction from a resolved row.

use crate::domain::extract_referring_domain;
use crate::error_handling::{ParseStats, RowAnomaly};
use crate::models::BacklinkRecord;

use super::fields::{Field, RawRow};
use super::values::{parse_count, parse_date, parse_flag, parse_number, parse_text};

/// Builds a [`BacklinkRecord`] from one report row.
///
/// Returns `None` (and counts the anomaly) when the row has no referring page
/// URL or the URL yields no domain; every other field falls back to its
/// default.
pub fn build_record(row: &RawRow<'_>, stats: &mut ParseStats) -> Option<BacklinkRecord> {
    let source_page_url = match row.field(Field::SourcePageUrl) {
        Some(url) if !url.trim().is_empty() => url,
        _ => {
            stats.increment(RowAnomaly::MissingSourceUrl);
            return None;
        }
    };

    let Some(referring_domain) = extract_referring_domain(source_page_url) else {
        stats.increment(RowAnomaly::EmptyDomain);
        return None;
    };

    Some(BacklinkRecord {
        source_page_url: source_page_url.to_string(),
        referring_domain,
        target_url: row.field(Field::TargetUrl).unwrap_or_default().to_string(),
        first_discovered_at: parse_date(row.field(Field::FirstSeen), stats),
        last_seen_at: parse_date(row.field(Field::LastSeen), stats),
        anchor_text: parse_text(row.field(Field::Anchor)),
        is_nofollow: parse_flag(row.field(Field::Nofollow)),
        is_ugc: parse_flag(row.field(Field::Ugc)),
        is_sponsored: parse_flag(row.field(Field::Sponsored)),
        domain_authority_score: parse_number(row.field(Field::AuthorityScore), stats),
        url_rating: parse_number(row.field(Field::UrlRating), stats),
        domain_traffic: parse_number(row.field(Field::DomainTraffic), stats),
        page_traffic: parse_number(row.field(Field::PageTraffic), stats),
        external_link_count: parse_count(row.field(Field::ExternalLinks), stats),
        language: parse_text(row.field(Field::Language)),
    })
}
