//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `backlink_intel` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use backlink_intel::config::{DB_PATH, DEFAULT_BATCH_SIZE, EXPORT_PREVIEW_LIMIT, TREND_RANGE_PRESETS};
use backlink_intel::export::{export_domains_csv, load_latest_snapshot};
use backlink_intel::initialization::init_logger_with;
use backlink_intel::library::{export_to_library, preview_export, LinkStatus, PricingType};
use backlink_intel::storage::{
    delete_site, find_site_by_host, init_db_pool_with_path, latest_snapshot, library_usage,
    list_sites, SqliteCatalog,
};
use backlink_intel::{
    build_trend_now, normalize_domain, rollup, run_import, Catalog, Config, ImportOptions,
    LogFormat, LogLevel, TrendMode, TrendRange,
};

/// Backlink report ingestion and analysis.
#[derive(Debug, Parser)]
#[command(name = "backlink_intel", version, about)]
struct Cli {
    /// SQLite database path
    #[arg(long = "db", env = "BACKLINK_INTEL_DB", default_value = DB_PATH, global = true)]
    db_path: PathBuf,

    /// Log level
    #[arg(long, value_enum, env = "BACKLINK_INTEL_LOG_LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import report files (CSV/TSV/XLSX) sequentially as new snapshots
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Site display name (defaults to the host)
        #[arg(long)]
        site_name: Option<String>,
        /// Site host (defaults to the part of the file name before "-backlinks")
        #[arg(long)]
        host: Option<String>,
        /// Note stored on each snapshot
        #[arg(long)]
        notes: Option<String>,
        /// Records per storage transaction
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Print the referring-domain discovery trend of a site's latest snapshot
    Trend {
        host: String,
        #[arg(long, value_enum, default_value = "cumulative")]
        mode: TrendMode,
        /// Trailing window in days (30, 90, 180, 365) or "all"
        #[arg(long, default_value = "180", value_parser = parse_trend_range)]
        range: TrendRange,
        /// Print the series, with drill-down records, as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the referring-domain rollup of a site's latest snapshot as CSV
    Domains {
        host: String,
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List sites with their latest snapshot metrics
    Sites,
    /// Delete a site with all of its snapshots and backlinks
    DeleteSite { host: String },
    /// Add a site's referring domains to the outreach library
    LibraryExport {
        host: String,
        #[arg(long, value_enum, default_value = "unknown")]
        pricing: PricingType,
        #[arg(long, value_enum, default_value = "not-tried")]
        status: LinkStatus,
        /// Also overwrite pricing and status of domains already in the library
        #[arg(long)]
        include_existing: bool,
        /// Number of top-authority domains considered
        #[arg(long, default_value_t = EXPORT_PREVIEW_LIMIT)]
        limit: usize,
    },
    /// Show which sites a library domain links to
    LibraryUsage { domain: String },
}

fn parse_trend_range(value: &str) -> Result<TrendRange, String> {
    let range: TrendRange = value.parse()?;
    match range {
        TrendRange::Days(days) if !TREND_RANGE_PRESETS.contains(&days) => Err(format!(
            "unsupported range {days}: choose one of {:?} or 'all'",
            TREND_RANGE_PRESETS
        )),
        _ => Ok(range),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();

    let config = Config {
        log_level: cli.log_level.clone(),
        log_format: cli.log_format.clone(),
        db_path: cli.db_path.clone(),
        ..Default::default()
    };
    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    if let Err(e) = run(cli.command, config).await {
        eprintln!("backlink_intel error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, mut config: Config) -> Result<()> {
    match command {
        Command::Import {
            files,
            site_name,
            host,
            notes,
            batch_size,
        } => {
            config.batch_size = batch_size;
            let options = ImportOptions {
                site_name,
                host,
                notes,
            };
            let report = run_import(&config, &files, &options).await?;
            for file in &report.files {
                println!(
                    "✅ {} → {} ({} links, {} referring domains, {} dofollow)",
                    file.snapshot.source_file_name,
                    file.site.canonical_host,
                    file.snapshot.metrics.total_links,
                    file.snapshot.metrics.total_referring_domains,
                    file.snapshot.metrics.total_dofollow_links
                );
                match &file.library_sync {
                    Ok(sync) => println!(
                        "   library: {} new, {} already catalogued",
                        sync.inserted, sync.already_present
                    ),
                    Err(e) => println!("   ⚠️ library sync failed: {e}"),
                }
            }
            println!(
                "Imported {} file{} ({} records) in {:.1}s into {}",
                report.files.len(),
                if report.files.len() == 1 { "" } else { "s" },
                report.total_records(),
                report.elapsed_seconds,
                report.db_path.display()
            );
        }
        Command::Trend {
            host,
            mode,
            range,
            json,
        } => {
            let pool = open(&config).await?;
            let latest = load_latest_snapshot(&pool, &host).await?;
            let series = build_trend_now(&latest.records, mode, range);
            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
                return Ok(());
            }
            if series.is_empty() {
                println!("No dated referring domains in range {range}");
            }
            for point in &series {
                println!(
                    "{}  {:>6}  (+{} new, {} links)",
                    point.date,
                    point.count,
                    point.new_domains,
                    point.records.len()
                );
            }
        }
        Command::Domains { host, output } => {
            let count = export_domains_csv(&config.db_path, &host, output.as_ref()).await?;
            if let Some(path) = output {
                println!("Exported {} domains to {}", count, path.display());
            }
        }
        Command::Sites => {
            let pool = open(&config).await?;
            for site in list_sites(&pool).await? {
                match latest_snapshot(&pool, &site.id).await? {
                    Some(snapshot) => println!(
                        "{} ({}): {} links, {} referring domains, last import {}",
                        site.canonical_host,
                        site.name,
                        snapshot.metrics.total_links,
                        snapshot.metrics.total_referring_domains,
                        snapshot.imported_at.format("%Y-%m-%d %H:%M")
                    ),
                    None => println!("{} ({}): no snapshots", site.canonical_host, site.name),
                }
            }
        }
        Command::DeleteSite { host } => {
            let pool = open(&config).await?;
            let host = normalize_domain(&host);
            let Some(site) = find_site_by_host(&pool, &host).await? else {
                bail!("No site with host {host}");
            };
            let deleted = delete_site(&pool, &site.id).await?;
            println!(
                "Deleted {} with {} snapshots and {} backlinks",
                site.canonical_host, deleted.snapshots, deleted.backlinks
            );
        }
        Command::LibraryExport {
            host,
            pricing,
            status,
            include_existing,
            limit,
        } => {
            let pool = open(&config).await?;
            let latest = load_latest_snapshot(&pool, &host).await?;
            let catalog = SqliteCatalog::new(pool.as_ref().clone());
            let summaries = rollup(&latest.records, &latest.catalog_domains);

            let selections: Vec<_> = preview_export(&summaries, &catalog, limit)
                .await?
                .into_iter()
                .filter(|item| item.selected || include_existing)
                .map(|item| {
                    let mut selection = item.to_selection();
                    selection.pricing_type = pricing;
                    selection.status = status;
                    selection
                })
                .collect();
            let report = export_to_library(&selections, &catalog, Utc::now()).await?;
            println!(
                "Library updated: {} created, {} updated",
                report.created, report.updated
            );
        }
        Command::LibraryUsage { domain } => {
            let pool = open(&config).await?;
            let catalog = SqliteCatalog::new(pool.as_ref().clone());
            let domain = normalize_domain(&domain);
            let Some(entry) = catalog.find_by_domain(&domain).await? else {
                bail!("{domain} is not in the library");
            };
            println!(
                "{} [{} / {}] {}",
                entry.domain,
                entry.pricing_type,
                entry.status,
                entry.notes.as_deref().unwrap_or("")
            );
            for edge in library_usage(&pool, &entry.id, &entry.domain).await? {
                println!(
                    "  site {}: {} backlinks, last seen {}",
                    edge.site_id,
                    edge.count_backlinks,
                    edge.last_seen
                        .map(|t| t.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
    }
    Ok(())
}

async fn open(config: &Config) -> Result<std::sync::Arc<sqlx::SqlitePool>> {
    init_db_pool_with_path(&config.db_path)
        .await
        .context("Failed to initialize database pool")
}
