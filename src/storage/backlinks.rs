//! Backlink row persistence.

use std::collections::HashSet;

use log::debug;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::utils::{build_batch_insert_query, to_count, to_sql_count};
use crate::config::SQLITE_MAX_ROWS_PER_STATEMENT;
use crate::error_handling::DatabaseError;
use crate::library::LibraryUsageEdge;
use crate::models::{from_millis, to_millis, BacklinkRecord};

const BACKLINK_COLUMNS: &[&str] = &[
    "snapshot_id",
    "site_id",
    "source_page_url",
    "referring_domain",
    "target_url",
    "first_seen_ms",
    "last_seen_ms",
    "anchor_text",
    "is_nofollow",
    "is_ugc",
    "is_sponsored",
    "authority_score",
    "url_rating",
    "domain_traffic",
    "page_traffic",
    "external_links",
    "language",
];

fn record_from_row(row: &SqliteRow) -> Result<BacklinkRecord, DatabaseError> {
    Ok(BacklinkRecord {
        source_page_url: row.try_get("source_page_url")?,
        referring_domain: row.try_get("referring_domain")?,
        target_url: row.try_get("target_url")?,
        first_discovered_at: from_millis(row.try_get("first_seen_ms")?),
        last_seen_at: from_millis(row.try_get("last_seen_ms")?),
        anchor_text: row.try_get("anchor_text")?,
        is_nofollow: row.try_get("is_nofollow")?,
        is_ugc: row.try_get("is_ugc")?,
        is_sponsored: row.try_get("is_sponsored")?,
        domain_authority_score: row.try_get("authority_score")?,
        url_rating: row.try_get("url_rating")?,
        domain_traffic: row.try_get("domain_traffic")?,
        page_traffic: row.try_get("page_traffic")?,
        external_link_count: to_count("external_links", row.try_get("external_links")?)?,
        language: row.try_get("language")?,
    })
}

/// Writes one batch of a snapshot's records in a single transaction.
///
/// The batch is split into multi-row statements small enough for SQLite's
/// bound-parameter limit. Returns the number of rows written.
pub async fn insert_backlink_batch(
    pool: &SqlitePool,
    snapshot_id: &str,
    site_id: &str,
    records: &[BacklinkRecord],
) -> Result<u64, DatabaseError> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut written = 0;

    for chunk in records.chunks(SQLITE_MAX_ROWS_PER_STATEMENT) {
        let query = build_batch_insert_query("backlinks", BACKLINK_COLUMNS, chunk.len(), None);
        let mut statement = sqlx::query(&query);
        for record in chunk {
            statement = statement
                .bind(snapshot_id)
                .bind(site_id)
                .bind(&record.source_page_url)
                .bind(&record.referring_domain)
                .bind(&record.target_url)
                .bind(to_millis(record.first_discovered_at.as_ref()))
                .bind(to_millis(record.last_seen_at.as_ref()))
                .bind(&record.anchor_text)
                .bind(record.is_nofollow)
                .bind(record.is_ugc)
                .bind(record.is_sponsored)
                .bind(record.domain_authority_score)
                .bind(record.url_rating)
                .bind(record.domain_traffic)
                .bind(record.page_traffic)
                .bind(to_sql_count(record.external_link_count))
                .bind(&record.language);
        }
        written += statement.execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    debug!("Wrote {} backlinks for snapshot {}", written, snapshot_id);
    Ok(written)
}

/// All records of a snapshot, in import order.
pub async fn records_for_snapshot(
    pool: &SqlitePool,
    snapshot_id: &str,
) -> Result<Vec<BacklinkRecord>, DatabaseError> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM backlinks WHERE snapshot_id = ? ORDER BY id",
        BACKLINK_COLUMNS.join(", ")
    ))
    .bind(snapshot_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(record_from_row).collect()
}

/// Removes every record stored under `snapshot_id`.
pub async fn delete_backlinks_for_snapshot(
    pool: &SqlitePool,
    snapshot_id: &str,
) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM backlinks WHERE snapshot_id = ?")
        .bind(snapshot_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Distinct referring domains of a snapshot.
pub async fn snapshot_domains(
    pool: &SqlitePool,
    snapshot_id: &str,
) -> Result<HashSet<String>, DatabaseError> {
    let domains: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT referring_domain FROM backlinks WHERE snapshot_id = ?")
            .bind(snapshot_id)
            .fetch_all(pool)
            .await?;
    Ok(domains.into_iter().collect())
}

/// Per-site backlink counts for `domain` across every committed snapshot.
///
/// Rows of an import that never committed its snapshot are not counted.
pub async fn library_usage(
    pool: &SqlitePool,
    domain_id: &str,
    domain: &str,
) -> Result<Vec<LibraryUsageEdge>, DatabaseError> {
    let rows = sqlx::query(
        "SELECT b.site_id AS site_id, COUNT(*) AS count_backlinks, MAX(b.last_seen_ms) AS last_seen_ms
         FROM backlinks b
         JOIN snapshots s ON s.id = b.snapshot_id
         WHERE b.referring_domain = ?
         GROUP BY b.site_id
         ORDER BY count_backlinks DESC, b.site_id",
    )
    .bind(domain)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(LibraryUsageEdge {
                domain_id: domain_id.to_string(),
                site_id: row.try_get("site_id")?,
                count_backlinks: to_count("count_backlinks", row.try_get("count_backlinks")?)?,
                last_seen: from_millis(row.try_get("last_seen_ms")?),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::{create_test_pool, sample_record, sample_snapshot};
    use crate::storage::{find_or_create_site, insert_snapshot};
    use chrono::Utc;

    #[tokio::test]
    async fn test_batch_larger_than_statement_limit() {
        let pool = create_test_pool().await;
        let site = find_or_create_site(&pool, "", "example.com", Utc::now())
            .await
            .unwrap();

        let records: Vec<BacklinkRecord> = (0..SQLITE_MAX_ROWS_PER_STATEMENT * 2 + 7)
            .map(|i| sample_record(&format!("d{}.example", i % 50), i as f64 % 90.0))
            .collect();
        let written = insert_backlink_batch(&pool, "snap-1", &site.id, &records)
            .await
            .unwrap();
        assert_eq!(written, records.len() as u64);

        let loaded = records_for_snapshot(&pool, "snap-1").await.unwrap();
        assert_eq!(loaded, records);
        assert_eq!(snapshot_domains(&pool, "snap-1").await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_delete_by_snapshot_only_touches_that_snapshot() {
        let pool = create_test_pool().await;
        let site = find_or_create_site(&pool, "", "example.com", Utc::now())
            .await
            .unwrap();
        let records = vec![sample_record("a.example", 10.0)];
        insert_backlink_batch(&pool, "keep", &site.id, &records).await.unwrap();
        insert_backlink_batch(&pool, "drop", &site.id, &records).await.unwrap();

        assert_eq!(delete_backlinks_for_snapshot(&pool, "drop").await.unwrap(), 1);
        assert!(records_for_snapshot(&pool, "drop").await.unwrap().is_empty());
        assert_eq!(records_for_snapshot(&pool, "keep").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_library_usage_counts_committed_snapshots_only() {
        let pool = create_test_pool().await;
        let now = Utc::now();
        let site = find_or_create_site(&pool, "", "example.com", now).await.unwrap();
        let snapshot = sample_snapshot(&site.id, "a.csv", now);
        insert_snapshot(&pool, &snapshot).await.unwrap();

        let records = vec![
            sample_record("blog.example", 40.0),
            sample_record("blog.example", 40.0),
            sample_record("other.example", 40.0),
        ];
        insert_backlink_batch(&pool, &snapshot.id, &site.id, &records)
            .await
            .unwrap();
        // Orphan rows from an import that never committed
        insert_backlink_batch(&pool, "uncommitted", &site.id, &records)
            .await
            .unwrap();

        let usage = library_usage(&pool, "lib-1", "blog.example").await.unwrap();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].site_id, site.id);
        assert_eq!(usage[0].count_backlinks, 2);
        assert_eq!(usage[0].domain_id, "lib-1");
    }
}
