//! Shared loading helpers for the read-side commands.

use std::collections::HashSet;
use std::io::{self, ErrorKind, Write};

use anyhow::{bail, Result};
use sqlx::SqlitePool;

use crate::domain::normalize_domain;
use crate::models::{BacklinkRecord, Site, Snapshot};
use crate::storage::{find_site_by_host, latest_snapshot, records_for_snapshot, SqliteCatalog};

/// Wrapper around a Write that ignores broken pipe errors (EPIPE).
/// This allows graceful handling when stdout is piped to a command that exits early.
pub(crate) struct IgnoreBrokenPipe<W: Write> {
    inner: W,
}

impl<W: Write> IgnoreBrokenPipe<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for IgnoreBrokenPipe<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).or_else(|e| {
            if e.kind() == ErrorKind::BrokenPipe {
                // Ignore broken pipe - downstream command closed the pipe
                Ok(buf.len())
            } else {
                Err(e)
            }
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().or_else(|e| {
            if e.kind() == ErrorKind::BrokenPipe {
                Ok(())
            } else {
                Err(e)
            }
        })
    }
}

/// A site's latest snapshot with its records and the catalog membership set.
#[derive(Debug, Clone)]
pub struct LatestSnapshot {
    pub site: Site,
    pub snapshot: Snapshot,
    pub records: Vec<BacklinkRecord>,
    pub catalog_domains: HashSet<String>,
}

/// Loads everything the trend and rollup views need for `host`.
///
/// # Errors
///
/// Fails when the site is unknown or has no snapshot yet.
pub async fn load_latest_snapshot(pool: &SqlitePool, host: &str) -> Result<LatestSnapshot> {
    let host = normalize_domain(host);
    let Some(site) = find_site_by_host(pool, &host).await? else {
        bail!("No site with host {host}");
    };
    let Some(snapshot) = latest_snapshot(pool, &site.id).await? else {
        bail!("Site {host} has no imported snapshots");
    };
    let records = records_for_snapshot(pool, &snapshot.id).await?;
    let catalog_domains = SqliteCatalog::new(pool.clone()).domains().await?;

    Ok(LatestSnapshot {
        site,
        snapshot,
        records,
        catalog_domains,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::{create_test_pool, sample_record, sample_snapshot};
    use crate::storage::{find_or_create_site, insert_backlink_batch, insert_snapshot};
    use chrono::Utc;

    struct FailingWriter(ErrorKind);

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(self.0))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(self.0))
        }
    }

    #[test]
    fn test_broken_pipe_is_swallowed() {
        let mut writer = IgnoreBrokenPipe::new(FailingWriter(ErrorKind::BrokenPipe));
        assert_eq!(writer.write(b"abc").unwrap(), 3);
        assert!(writer.flush().is_ok());

        let mut writer = IgnoreBrokenPipe::new(FailingWriter(ErrorKind::PermissionDenied));
        assert!(writer.write(b"abc").is_err());
    }

    #[tokio::test]
    async fn test_load_latest_snapshot() {
        let pool = create_test_pool().await;
        let site = find_or_create_site(&pool, "", "example.com", Utc::now())
            .await
            .unwrap();
        let snapshot = sample_snapshot(&site.id, "example.com-backlinks.csv", Utc::now());
        insert_snapshot(&pool, &snapshot).await.unwrap();
        insert_backlink_batch(&pool, &snapshot.id, &site.id, &[sample_record("a.example", 10.0)])
            .await
            .unwrap();

        let latest = load_latest_snapshot(&pool, "https://www.Example.com/")
            .await
            .unwrap();
        assert_eq!(latest.snapshot.id, snapshot.id);
        assert_eq!(latest.records.len(), 1);
        assert!(latest.catalog_domains.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_site_and_empty_site() {
        let pool = create_test_pool().await;
        let err = load_latest_snapshot(&pool, "missing.example").await.unwrap_err();
        assert!(err.to_string().contains("No site with host missing.example"));

        find_or_create_site(&pool, "", "empty.example", Utc::now())
            .await
            .unwrap();
        let err = load_latest_snapshot(&pool, "empty.example").await.unwrap_err();
        assert!(err.to_string().contains("no imported snapshots"));
    }
}
