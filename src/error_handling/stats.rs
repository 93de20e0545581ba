//! Per-file row-anomaly statistics.
//!
//! Parsing runs to completion on one task, so the counters are plain integers
//! owned by the parse call rather than shared atomics.

use std::collections::HashMap;
use strum::IntoEnumIterator;

use super::types::RowAnomaly;

/// Counts of silently recovered row anomalies for one parsed report.
#[derive(Debug, Clone)]
pub struct ParseStats {
    counts: HashMap<RowAnomaly, usize>,
}

impl Default for ParseStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseStats {
    pub fn new() -> Self {
        let mut counts = HashMap::new();
        for anomaly in RowAnomaly::iter() {
            counts.insert(anomaly, 0);
        }
        ParseStats { counts }
    }

    pub fn increment(&mut self, anomaly: RowAnomaly) {
        *self.counts.entry(anomaly).or_insert(0) += 1;
    }

    pub fn get_count(&self, anomaly: RowAnomaly) -> usize {
        self.counts.get(&anomaly).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Number of rows discarded outright.
    pub fn dropped_rows(&self) -> usize {
        RowAnomaly::iter()
            .filter(|a| a.drops_row())
            .map(|a| self.get_count(a))
            .sum()
    }

    /// Logs non-zero counters at debug level.
    pub fn log_summary(&self, file: &str) {
        if self.total() == 0 {
            return;
        }
        log::debug!("Row anomalies in {} ({} total):", file, self.total());
        for anomaly in RowAnomaly::iter() {
            let count = self.get_count(anomaly);
            if count > 0 {
                log::debug!("   {}: {}", anomaly.as_str(), count);
            }
        }
    }
}
