//! Shared test helpers for storage module tests.
//!
//! This module provides common utilities for database setup and test data creation
//! used across storage module tests.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;

use crate::models::{BacklinkRecord, Snapshot, SnapshotMetrics};
use crate::storage::run_migrations;

/// Creates a test database pool with migrations applied.
/// Uses an in-memory database for fast test execution.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Drops sub-millisecond precision so values survive a storage round trip.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts.timestamp_millis()).expect("timestamp in range")
}

/// A record with fixed dates and the given domain and authority.
pub fn sample_record(domain: &str, authority: f64) -> BacklinkRecord {
    BacklinkRecord {
        source_page_url: format!("https://{domain}/article"),
        referring_domain: domain.to_string(),
        target_url: "https://example.com/".to_string(),
        first_discovered_at: Some(Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap()),
        last_seen_at: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
        anchor_text: Some("example".to_string()),
        is_nofollow: false,
        is_ugc: false,
        is_sponsored: true,
        domain_authority_score: authority,
        url_rating: 12.0,
        domain_traffic: 1500.0,
        page_traffic: 40.0,
        external_link_count: 25,
        language: Some("en".to_string()),
    }
}

/// A snapshot row for `site_id` with plausible metrics.
pub fn sample_snapshot(site_id: &str, file: &str, imported_at: DateTime<Utc>) -> Snapshot {
    let imported_at = truncate_to_millis(imported_at);
    Snapshot {
        id: uuid::Uuid::new_v4().to_string(),
        site_id: site_id.to_string(),
        source_file_name: file.to_string(),
        imported_at,
        data_cutoff_at: Some(imported_at),
        record_count: 3,
        notes: None,
        metrics: SnapshotMetrics {
            total_links: 3,
            total_referring_domains: 2,
            total_dofollow_links: 2,
            total_dofollow_referring_domains: 1,
            earliest_first_seen: Some(Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()),
            latest_first_seen: Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()),
        },
    }
}
