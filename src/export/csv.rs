//! CSV export of a snapshot's referring-domain rollup.
//!
//! One row per referring domain, highest authority first.

use anyhow::{Context, Result};
use csv::Writer;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::queries::{load_latest_snapshot, IgnoreBrokenPipe};
use crate::rollup::{rollup, sort_by_authority, DomainSummary};
use crate::storage::init_db_pool_with_path;

const DOMAIN_COLUMNS: [&str; 8] = [
    "domain",
    "authority_score",
    "links",
    "dofollow_links",
    "traffic",
    "external_links",
    "in_library",
    "risk",
];

/// Writes `summaries` as CSV in the order given. Returns the number of rows.
pub fn write_domains_csv<W: Write>(summaries: &[DomainSummary<'_>], writer: W) -> Result<usize> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(DOMAIN_COLUMNS)?;

    for summary in summaries {
        writer.write_record([
            summary.domain.to_string(),
            summary.authority_score.to_string(),
            summary.link_count.to_string(),
            summary.dofollow_count.to_string(),
            summary.traffic.to_string(),
            summary.external_link_count.to_string(),
            summary.in_catalog.to_string(),
            summary.risk.as_ref().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(summaries.len())
}

/// Exports the domain rollup of `host`'s latest snapshot.
///
/// # Arguments
///
/// * `db_path` - Path to the SQLite database
/// * `host` - Canonical host of the site
/// * `output` - Output file path (or stdout if None)
///
/// # Returns
///
/// Returns the number of domains exported, or an error if export fails.
pub async fn export_domains_csv(
    db_path: &Path,
    host: &str,
    output: Option<&PathBuf>,
) -> Result<usize> {
    let pool = init_db_pool_with_path(db_path)
        .await
        .context("Failed to initialize database pool")?;
    let latest = load_latest_snapshot(&pool, host).await?;

    let mut summaries = rollup(&latest.records, &latest.catalog_domains);
    sort_by_authority(&mut summaries);

    // Use trait object to handle both File and Stdout
    let sink: Box<dyn Write> = if let Some(output_path) = output {
        let file = std::fs::File::create(output_path).context(format!(
            "Failed to create output file: {}",
            output_path.display()
        ))?;
        Box::new(file)
    } else {
        Box::new(IgnoreBrokenPipe::new(io::stdout()))
    };

    let count = write_domains_csv(&summaries, sink)?;
    log::info!(
        "Exported {} domains from snapshot {} of {}",
        count,
        latest.snapshot.source_file_name,
        latest.site.canonical_host
    );
    Ok(count)
}
