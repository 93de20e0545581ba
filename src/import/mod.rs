//! Import orchestration.
//!
//! One file goes through: parse → resolve site → batched backlink writes →
//! snapshot row → library sync. The snapshot row is the commit marker and is
//! written only after every batch succeeded; a failed batch removes the rows
//! already written for that snapshot, so a visible snapshot is never
//! undercounted. Library sync runs after the commit and cannot undo it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use sqlx::SqlitePool;

use crate::config::{Config, FILE_NAME_HOST_MARKER, UNKNOWN_SITE_HOST};
use crate::domain::normalize_domain;
use crate::error_handling::{DatabaseError, ImportError, ParseStats};
use crate::library::{self, SyncReport};
use crate::models::{Site, Snapshot};
use crate::parse::{display_name, parse_file, ParseResult};
use crate::storage::{
    delete_backlinks_for_snapshot, delete_site_if_empty, find_or_create_site,
    init_db_pool_with_path, insert_backlink_batch, insert_snapshot, SqliteCatalog,
};

/// Which site the imported files belong to.
///
/// Unset fields are derived from each file's name.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Display name used when the site is created
    pub site_name: Option<String>,
    /// Canonical host of the site
    pub host: Option<String>,
    /// Free-form note stored on every snapshot
    pub notes: Option<String>,
}

/// Result of importing one file.
#[derive(Debug)]
pub struct FileImport {
    /// Site the snapshot was attached to
    pub site: Site,
    /// The committed snapshot
    pub snapshot: Snapshot,
    /// Row anomalies recovered while parsing
    pub stats: ParseStats,
    /// Library sync outcome; a failure here leaves the snapshot in place
    pub library_sync: Result<SyncReport, DatabaseError>,
}

/// Results of a multi-file import.
#[derive(Debug)]
pub struct ImportReport {
    /// Files imported, in processing order
    pub files: Vec<FileImport>,
    /// Path to the SQLite database holding the snapshots
    pub db_path: PathBuf,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
}

impl ImportReport {
    /// Total records stored across all files.
    pub fn total_records(&self) -> u64 {
        self.files.iter().map(|f| f.snapshot.record_count).sum()
    }
}

/// Derives a site host from an exporter file name.
///
/// Exporters name files `<host>-backlinks-<mode>.<ext>`; the part before
/// `-backlinks` is the host. Without the marker the file stem is used.
pub fn site_host_from_file_name(file_name: &str) -> String {
    let candidate = match file_name.find(FILE_NAME_HOST_MARKER) {
        Some(idx) => &file_name[..idx],
        None => Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name),
    };
    let host = normalize_domain(candidate);
    if host.is_empty() {
        UNKNOWN_SITE_HOST.to_string()
    } else {
        host
    }
}

/// Imports report files sequentially into the database named by `config`.
///
/// # Errors
///
/// Fails when the database cannot be opened, or on the first file that cannot
/// be parsed or stored. Files already imported before the failure stay
/// committed; the remaining files are not attempted.
pub async fn run_import(
    config: &Config,
    files: &[PathBuf],
    options: &ImportOptions,
) -> Result<ImportReport> {
    let started = Instant::now();
    let pool = init_db_pool_with_path(&config.db_path)
        .await
        .context("Failed to initialize database pool")?;

    let mut imported = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        info!(
            "Importing file {}/{}: {}",
            index + 1,
            files.len(),
            path.display()
        );
        let result = import_file(&pool, path, options, config.batch_size, Utc::now())
            .await
            .with_context(|| {
                format!(
                    "Import aborted at {} ({} of {} files committed)",
                    display_name(path),
                    index,
                    files.len()
                )
            })?;
        imported.push(result);
    }

    let report = ImportReport {
        files: imported,
        db_path: config.db_path.clone(),
        elapsed_seconds: started.elapsed().as_secs_f64(),
    };
    info!(
        "Imported {} files ({} records) in {:.2}s",
        report.files.len(),
        report.total_records(),
        report.elapsed_seconds
    );
    Ok(report)
}

/// Parses one report and stores it as a new snapshot.
///
/// # Errors
///
/// [`ImportError::Parse`] when the file cannot be decoded (nothing is
/// written), [`ImportError::Storage`] when a write fails (no snapshot row
/// exists afterwards, and a site created for it is removed again).
pub async fn import_file(
    pool: &SqlitePool,
    path: &Path,
    options: &ImportOptions,
    batch_size: usize,
    now: DateTime<Utc>,
) -> Result<FileImport, ImportError> {
    let file = display_name(path);
    let parsed = parse_file(path).await?;
    info!(
        "Parsed {} records ({} referring domains) from {}",
        parsed.metrics.total_links, parsed.metrics.total_referring_domains, file
    );

    let storage_err = |source| ImportError::Storage {
        file: file.clone(),
        source,
    };

    let host = options
        .host
        .as_deref()
        .map(normalize_domain)
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| site_host_from_file_name(&file));
    let site = find_or_create_site(pool, options.site_name.as_deref().unwrap_or(""), &host, now)
        .await
        .map_err(storage_err)?;

    let snapshot = Snapshot {
        id: uuid::Uuid::new_v4().to_string(),
        site_id: site.id.clone(),
        source_file_name: file.clone(),
        imported_at: now,
        data_cutoff_at: Some(now),
        record_count: parsed.records.len() as u64,
        notes: options.notes.clone(),
        metrics: parsed.metrics.clone(),
    };

    if let Err(e) = persist_snapshot(pool, &snapshot, &parsed, batch_size).await {
        discard_partial_snapshot(pool, &snapshot).await;
        return Err(storage_err(e));
    }
    info!(
        "Committed snapshot {} for {} ({} records)",
        snapshot.id, site.canonical_host, snapshot.record_count
    );

    let discovered: BTreeSet<String> = parsed
        .records
        .iter()
        .map(|r| r.referring_domain.clone())
        .collect();
    let catalog = SqliteCatalog::new(pool.clone());
    let library_sync = library::sync(&discovered, &file, &catalog, now).await;
    if let Err(e) = &library_sync {
        warn!("Library sync failed for {}: {}", file, e);
    }

    Ok(FileImport {
        site,
        snapshot,
        stats: parsed.stats,
        library_sync,
    })
}

async fn persist_snapshot(
    pool: &SqlitePool,
    snapshot: &Snapshot,
    parsed: &ParseResult,
    batch_size: usize,
) -> Result<(), DatabaseError> {
    let batch_size = batch_size.max(1);
    let total = parsed.records.len();
    let batches = total.div_ceil(batch_size);
    let mut written = 0usize;

    for (index, batch) in parsed.records.chunks(batch_size).enumerate() {
        insert_backlink_batch(pool, &snapshot.id, &snapshot.site_id, batch).await?;
        written += batch.len();
        debug!(
            "Stored batch {}/{} for {} ({}/{} records)",
            index + 1,
            batches,
            snapshot.source_file_name,
            written,
            total
        );
    }

    insert_snapshot(pool, snapshot).await
}

// A site left without any committed snapshot is removed as well.
async fn discard_partial_snapshot(pool: &SqlitePool, snapshot: &Snapshot) {
    match delete_backlinks_for_snapshot(pool, &snapshot.id).await {
        Ok(removed) => debug!(
            "Removed {} rows of uncommitted snapshot {}",
            removed, snapshot.id
        ),
        Err(e) => warn!(
            "Failed to clean up rows of uncommitted snapshot {}: {}",
            snapshot.id, e
        ),
    }
    match delete_site_if_empty(pool, &snapshot.site_id).await {
        Ok(true) => debug!("Removed site {} with no committed snapshot", snapshot.site_id),
        Ok(false) => {}
        Err(e) => warn!(
            "Failed to clean up site {} of uncommitted snapshot {}: {}",
            snapshot.site_id, snapshot.id, e
        ),
    }
}
