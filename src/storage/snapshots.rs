//! Snapshot persistence.
//!
//! A snapshot row is the commit marker of an import: it is written only once
//! all of its backlinks are stored, so a visible snapshot is always complete.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::sites::required_millis;
use super::utils::{to_count, to_sql_count};
use crate::error_handling::DatabaseError;
use crate::models::{from_millis, to_millis, Snapshot, SnapshotMetrics};

const SNAPSHOT_COLUMNS: &str = "id, site_id, source_file_name, imported_at_ms, data_cutoff_at_ms, \
     record_count, notes, total_links, total_referring_domains, total_dofollow_links, \
     total_dofollow_referring_domains, earliest_first_seen_ms, latest_first_seen_ms";

fn snapshot_from_row(row: &SqliteRow) -> Result<Snapshot, DatabaseError> {
    Ok(Snapshot {
        id: row.try_get("id")?,
        site_id: row.try_get("site_id")?,
        source_file_name: row.try_get("source_file_name")?,
        imported_at: required_millis("imported_at_ms", row.try_get("imported_at_ms")?)?,
        data_cutoff_at: from_millis(row.try_get("data_cutoff_at_ms")?),
        record_count: to_count("record_count", row.try_get("record_count")?)?,
        notes: row.try_get("notes")?,
        metrics: SnapshotMetrics {
            total_links: to_count("total_links", row.try_get("total_links")?)?,
            total_referring_domains: to_count(
                "total_referring_domains",
                row.try_get("total_referring_domains")?,
            )?,
            total_dofollow_links: to_count(
                "total_dofollow_links",
                row.try_get("total_dofollow_links")?,
            )?,
            total_dofollow_referring_domains: to_count(
                "total_dofollow_referring_domains",
                row.try_get("total_dofollow_referring_domains")?,
            )?,
            earliest_first_seen: from_millis(row.try_get("earliest_first_seen_ms")?),
            latest_first_seen: from_millis(row.try_get("latest_first_seen_ms")?),
        },
    })
}

/// Writes the snapshot row.
pub async fn insert_snapshot(pool: &SqlitePool, snapshot: &Snapshot) -> Result<(), DatabaseError> {
    let metrics = &snapshot.metrics;
    sqlx::query(&format!(
        "INSERT INTO snapshots ({SNAPSHOT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(&snapshot.id)
    .bind(&snapshot.site_id)
    .bind(&snapshot.source_file_name)
    .bind(snapshot.imported_at.timestamp_millis())
    .bind(to_millis(snapshot.data_cutoff_at.as_ref()))
    .bind(to_sql_count(snapshot.record_count))
    .bind(&snapshot.notes)
    .bind(to_sql_count(metrics.total_links))
    .bind(to_sql_count(metrics.total_referring_domains))
    .bind(to_sql_count(metrics.total_dofollow_links))
    .bind(to_sql_count(metrics.total_dofollow_referring_domains))
    .bind(to_millis(metrics.earliest_first_seen.as_ref()))
    .bind(to_millis(metrics.latest_first_seen.as_ref()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_snapshot(pool: &SqlitePool, id: &str) -> Result<Option<Snapshot>, DatabaseError> {
    let row = sqlx::query(&format!("SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(snapshot_from_row).transpose()
}

/// Snapshots of a site, oldest import first.
pub async fn list_snapshots(
    pool: &SqlitePool,
    site_id: &str,
) -> Result<Vec<Snapshot>, DatabaseError> {
    let rows = sqlx::query(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE site_id = ?
         ORDER BY imported_at_ms, rowid"
    ))
    .bind(site_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(snapshot_from_row).collect()
}

/// Most recently imported snapshot of a site.
pub async fn latest_snapshot(
    pool: &SqlitePool,
    site_id: &str,
) -> Result<Option<Snapshot>, DatabaseError> {
    let row = sqlx::query(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE site_id = ?
         ORDER BY imported_at_ms DESC, rowid DESC LIMIT 1"
    ))
    .bind(site_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(snapshot_from_row).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::find_or_create_site;
    use crate::storage::test_helpers::{create_test_pool, sample_snapshot};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let pool = create_test_pool().await;
        let site = find_or_create_site(&pool, "", "example.com", Utc::now())
            .await
            .unwrap();
        let snapshot = sample_snapshot(&site.id, "example.com-backlinks.csv", Utc::now());
        insert_snapshot(&pool, &snapshot).await.unwrap();

        let loaded = get_snapshot(&pool, &snapshot.id).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn test_latest_and_listing_order() {
        let pool = create_test_pool().await;
        let site = find_or_create_site(&pool, "", "example.com", Utc::now())
            .await
            .unwrap();
        let now = Utc::now();
        let older = sample_snapshot(&site.id, "jan.csv", now - Duration::days(30));
        let newer = sample_snapshot(&site.id, "feb.csv", now);
        insert_snapshot(&pool, &newer).await.unwrap();
        insert_snapshot(&pool, &older).await.unwrap();

        let listed = list_snapshots(&pool, &site.id).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|s| s.source_file_name.as_str()).collect();
        assert_eq!(names, vec!["jan.csv", "feb.csv"]);

        let latest = latest_snapshot(&pool, &site.id).await.unwrap().unwrap();
        assert_eq!(latest.source_file_name, "feb.csv");
    }

    #[tokio::test]
    async fn test_latest_snapshot_of_empty_site() {
        let pool = create_test_pool().await;
        assert!(latest_snapshot(&pool, "missing").await.unwrap().is_none());
    }
}
