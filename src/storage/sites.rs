//! Site persistence.

use chrono::{DateTime, Utc};
use log::info;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;
use crate::models::{from_millis, Site};

/// Rows removed by [`delete_site`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteDeletion {
    pub backlinks: u64,
    pub snapshots: u64,
}

const SITE_COLUMNS: &str = "id, name, canonical_host, created_at_ms, updated_at_ms";

pub(crate) fn required_millis(column: &'static str, ms: i64) -> Result<DateTime<Utc>, DatabaseError> {
    from_millis(Some(ms)).ok_or_else(|| DatabaseError::CorruptValue {
        column,
        value: ms.to_string(),
    })
}

fn site_from_row(row: &SqliteRow) -> Result<Site, DatabaseError> {
    Ok(Site {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        canonical_host: row.try_get("canonical_host")?,
        created_at: required_millis("created_at_ms", row.try_get("created_at_ms")?)?,
        updated_at: required_millis("updated_at_ms", row.try_get("updated_at_ms")?)?,
    })
}

/// Looks a site up by host, ignoring case.
pub async fn find_site_by_host(
    pool: &SqlitePool,
    host: &str,
) -> Result<Option<Site>, DatabaseError> {
    let row = sqlx::query(&format!(
        "SELECT {SITE_COLUMNS} FROM sites WHERE canonical_host = ? COLLATE NOCASE"
    ))
    .bind(host)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(site_from_row).transpose()
}

/// Returns the site for `host`, creating it when absent.
///
/// The host is stored lower-cased. `name` falls back to the host when blank
/// and is ignored for an existing site.
pub async fn find_or_create_site(
    pool: &SqlitePool,
    name: &str,
    host: &str,
    now: DateTime<Utc>,
) -> Result<Site, DatabaseError> {
    let host = host.trim().to_lowercase();
    let name = match name.trim() {
        "" => host.as_str(),
        trimmed => trimmed,
    };
    let now_ms = now.timestamp_millis();

    let result = sqlx::query(
        "INSERT INTO sites (id, name, canonical_host, created_at_ms, updated_at_ms)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT DO NOTHING",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(name)
    .bind(&host)
    .bind(now_ms)
    .bind(now_ms)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!("Created site {} ({})", name, host);
    }

    find_site_by_host(pool, &host)
        .await?
        .ok_or(DatabaseError::SqlError(sqlx::Error::RowNotFound))
}

/// Lists all sites ordered by name.
pub async fn list_sites(pool: &SqlitePool) -> Result<Vec<Site>, DatabaseError> {
    let rows = sqlx::query(&format!(
        "SELECT {SITE_COLUMNS} FROM sites ORDER BY name, canonical_host"
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(site_from_row).collect()
}

/// Deletes a site with all of its snapshots and backlinks.
///
/// Runs in one transaction: backlinks first, then snapshots, then the site.
pub async fn delete_site(pool: &SqlitePool, site_id: &str) -> Result<SiteDeletion, DatabaseError> {
    let mut tx = pool.begin().await?;

    let backlinks = sqlx::query("DELETE FROM backlinks WHERE site_id = ?")
        .bind(site_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let snapshots = sqlx::query("DELETE FROM snapshots WHERE site_id = ?")
        .bind(site_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM sites WHERE id = ?")
        .bind(site_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        "Deleted site {} ({} snapshots, {} backlinks)",
        site_id, snapshots, backlinks
    );
    Ok(SiteDeletion {
        backlinks,
        snapshots,
    })
}

/// Removes a site that has no committed snapshot.
///
/// Used to undo the site row created by an import whose snapshot never
/// committed. Returns `true` when a row was removed.
pub async fn delete_site_if_empty(
    pool: &SqlitePool,
    site_id: &str,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query(
        "DELETE FROM sites
         WHERE id = ? AND NOT EXISTS (SELECT 1 FROM snapshots WHERE site_id = ?)",
    )
    .bind(site_id)
    .bind(site_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
