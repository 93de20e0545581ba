//! Discovery trend aggregation.
//!
//! Builds a per-day time series of newly discovered referring domains from a
//! record set. A domain counts as new exactly once: on the UTC day of the
//! earliest `first_discovered_at` among all of its records. Records without a
//! first-seen date are ignored.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::BacklinkRecord;

/// How each point's `count` is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TrendMode {
    /// Running total of newly discovered domains up to and including the day
    #[default]
    Cumulative,
    /// Domains newly discovered on the day itself
    Daily,
}

/// Trailing window applied to the finished series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendRange {
    /// Keep days no older than this many days before "now"
    Days(u32),
    /// No filtering
    All,
}

impl Default for TrendRange {
    fn default() -> Self {
        TrendRange::Days(crate::config::DEFAULT_TREND_RANGE_DAYS)
    }
}

impl FromStr for TrendRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(TrendRange::All);
        }
        s.parse::<u32>()
            .map(TrendRange::Days)
            .map_err(|_| format!("invalid trend range '{s}': expected a number of days or 'all'"))
    }
}

impl fmt::Display for TrendRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendRange::Days(days) => write!(f, "{days}"),
            TrendRange::All => f.write_str("all"),
        }
    }
}

/// One day of the discovery series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint<'a> {
    pub date: NaiveDate,
    /// Value plotted for the chosen [`TrendMode`]
    pub count: u64,
    /// Domains first discovered on this day, whatever the mode
    pub new_domains: u64,
    /// Every record first seen on this day, for drill-down
    pub records: Vec<&'a BacklinkRecord>,
}

#[derive(Default)]
struct DayBucket<'a> {
    new_domains: u64,
    records: Vec<&'a BacklinkRecord>,
}

/// Builds the discovery series as of `now`.
///
/// Points are sorted ascending by date, one per day that has at least one
/// dated record (a day may contribute zero new domains). Empty input yields
/// an empty series.
pub fn build_trend<'a>(
    records: &'a [BacklinkRecord],
    mode: TrendMode,
    range: TrendRange,
    now: DateTime<Utc>,
) -> Vec<TrendPoint<'a>> {
    let mut days: BTreeMap<NaiveDate, DayBucket<'a>> = BTreeMap::new();
    let mut domain_first_seen: HashMap<&'a str, DateTime<Utc>> = HashMap::new();

    for record in records {
        let Some(first_seen) = record.first_discovered_at else {
            continue;
        };
        days.entry(first_seen.date_naive())
            .or_default()
            .records
            .push(record);
        domain_first_seen
            .entry(record.referring_domain.as_str())
            .and_modify(|earliest| {
                if first_seen < *earliest {
                    *earliest = first_seen;
                }
            })
            .or_insert(first_seen);
    }

    for earliest in domain_first_seen.values() {
        if let Some(bucket) = days.get_mut(&earliest.date_naive()) {
            bucket.new_domains += 1;
        }
    }

    let mut running_total = 0u64;
    let series = days.into_iter().map(|(date, bucket)| {
        running_total += bucket.new_domains;
        TrendPoint {
            date,
            count: match mode {
                TrendMode::Cumulative => running_total,
                TrendMode::Daily => bucket.new_domains,
            },
            new_domains: bucket.new_domains,
            records: bucket.records,
        }
    });

    match range {
        TrendRange::All => series.collect(),
        TrendRange::Days(window) => {
            let max_age = Duration::days(i64::from(window));
            series
                .filter(|point| now - day_start(point.date) <= max_age)
                .collect()
        }
    }
}

/// [`build_trend`] evaluated against the current time.
pub fn build_trend_now(
    records: &[BacklinkRecord],
    mode: TrendMode,
    range: TrendRange,
) -> Vec<TrendPoint<'_>> {
    build_trend(records, mode, range, Utc::now())
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
