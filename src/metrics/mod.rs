//! Snapshot metrics.
//!
//! Derives the summary counters stored alongside each snapshot. The parser
//! feeds records into a [`MetricsAccumulator`] as it builds them, so the
//! metrics come out of the same single pass; [`compute_metrics`] runs the
//! accumulator over an existing record set.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::{BacklinkRecord, SnapshotMetrics};

/// Single-pass accumulator for [`SnapshotMetrics`].
#[derive(Debug, Default)]
pub struct MetricsAccumulator {
    total_links: u64,
    dofollow_links: u64,
    domains: HashSet<String>,
    dofollow_domains: HashSet<String>,
    earliest_first_seen: Option<DateTime<Utc>>,
    latest_first_seen: Option<DateTime<Utc>>,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one record into the running totals.
    pub fn observe(&mut self, record: &BacklinkRecord) {
        self.total_links += 1;
        if !self.domains.contains(&record.referring_domain) {
            self.domains.insert(record.referring_domain.clone());
        }

        if record.is_dofollow() {
            self.dofollow_links += 1;
            if !self.dofollow_domains.contains(&record.referring_domain) {
                self.dofollow_domains
                    .insert(record.referring_domain.clone());
            }
        }

        if let Some(first_seen) = record.first_discovered_at {
            self.earliest_first_seen = Some(match self.earliest_first_seen {
                Some(current) => current.min(first_seen),
                None => first_seen,
            });
            self.latest_first_seen = Some(match self.latest_first_seen {
                Some(current) => current.max(first_seen),
                None => first_seen,
            });
        }
    }

    pub fn finish(self) -> SnapshotMetrics {
        SnapshotMetrics {
            total_links: self.total_links,
            total_referring_domains: self.domains.len() as u64,
            total_dofollow_links: self.dofollow_links,
            total_dofollow_referring_domains: self.dofollow_domains.len() as u64,
            earliest_first_seen: self.earliest_first_seen,
            latest_first_seen: self.latest_first_seen,
        }
    }
}

/// Computes metrics for an already-built record set.
pub fn compute_metrics<'a, I>(records: I) -> SnapshotMetrics
where
    I: IntoIterator<Item = &'a BacklinkRecord>,
{
    let mut acc = MetricsAccumulator::new();
    for record in records {
        acc.observe(record);
    }
    acc.finish()
}
