//! Per-referring-domain rollup and spam-risk classification.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::config::{LINK_FARM_EXTERNAL_LINKS, LOW_TRUST_AUTHORITY};
use crate::models::BacklinkRecord;

/// Advisory spam heuristic outcome. Not a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskClass {
    Healthy,
    AtRisk,
}

/// Classifies a domain from its outbound-link density and authority.
///
/// At-risk when `external_links` exceeds the link-farm threshold or
/// `authority` falls below the low-trust threshold.
pub fn classify(external_links: u64, authority: f64) -> RiskClass {
    if external_links > LINK_FARM_EXTERNAL_LINKS || authority < LOW_TRUST_AUTHORITY {
        RiskClass::AtRisk
    } else {
        RiskClass::Healthy
    }
}

/// Aggregate view of all links from one referring domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainSummary<'a> {
    pub domain: &'a str,
    /// Taken from the representative (first) record, not aggregated
    pub authority_score: f64,
    pub link_count: u64,
    pub dofollow_count: u64,
    /// Representative record's domain traffic
    pub traffic: f64,
    /// Representative record's external link count
    pub external_link_count: u64,
    pub in_catalog: bool,
    pub risk: RiskClass,
    #[serde(skip)]
    pub links: Vec<&'a BacklinkRecord>,
}

impl DomainSummary<'_> {
    pub fn is_at_risk(&self) -> bool {
        self.risk == RiskClass::AtRisk
    }
}

/// Groups `records` by referring domain.
///
/// The representative record of a group is the one with the lowest index in
/// `records`. Output is sorted by domain, so identical input always yields
/// identical output.
pub fn rollup<'a>(
    records: &'a [BacklinkRecord],
    catalog_domains: &HashSet<String>,
) -> Vec<DomainSummary<'a>> {
    let mut groups: BTreeMap<&'a str, DomainSummary<'a>> = BTreeMap::new();

    for record in records {
        let summary = groups
            .entry(record.referring_domain.as_str())
            .or_insert_with(|| DomainSummary {
                domain: record.referring_domain.as_str(),
                authority_score: record.domain_authority_score,
                link_count: 0,
                dofollow_count: 0,
                traffic: record.domain_traffic,
                external_link_count: record.external_link_count,
                in_catalog: catalog_domains.contains(&record.referring_domain),
                risk: classify(record.external_link_count, record.domain_authority_score),
                links: Vec::new(),
            });
        summary.link_count += 1;
        if record.is_dofollow() {
            summary.dofollow_count += 1;
        }
        summary.links.push(record);
    }

    groups.into_values().collect()
}

/// Orders summaries by authority score descending, ties broken by domain.
pub fn sort_by_authority(summaries: &mut [DomainSummary<'_>]) {
    summaries.sort_by(|a, b| {
        b.authority_score
            .partial_cmp(&a.authority_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.domain.cmp(b.domain))
    });
}
