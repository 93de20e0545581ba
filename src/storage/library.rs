//! SQLite-backed outreach library.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::sites::required_millis;
use super::utils::parse_label;
use crate::error_handling::DatabaseError;
use crate::library::{Catalog, InsertOutcome, LibraryDomain};

const LIBRARY_COLUMNS: &str = "id, domain, display_name, type_tags, domain_type, pricing_type, \
     price_amount, currency, submission_url, contact, status, notes, created_at_ms, updated_at_ms";

fn entry_from_row(row: &SqliteRow) -> Result<LibraryDomain, DatabaseError> {
    let type_tags: String = row.try_get("type_tags")?;
    let type_tags = serde_json::from_str(&type_tags).map_err(|_| DatabaseError::CorruptValue {
        column: "type_tags",
        value: type_tags.clone(),
    })?;

    Ok(LibraryDomain {
        id: row.try_get("id")?,
        domain: row.try_get("domain")?,
        display_name: row.try_get("display_name")?,
        type_tags,
        domain_type: parse_label("domain_type", row.try_get("domain_type")?)?,
        pricing_type: parse_label("pricing_type", row.try_get("pricing_type")?)?,
        price_amount: row.try_get("price_amount")?,
        currency: row.try_get("currency")?,
        submission_url: row.try_get("submission_url")?,
        contact: row.try_get("contact")?,
        status: parse_label("status", row.try_get("status")?)?,
        notes: row.try_get("notes")?,
        created_at: required_millis("created_at_ms", row.try_get("created_at_ms")?)?,
        updated_at: required_millis("updated_at_ms", row.try_get("updated_at_ms")?)?,
    })
}

fn encode_tags(tags: &[String]) -> Result<String, DatabaseError> {
    serde_json::to_string(tags).map_err(|e| DatabaseError::CorruptValue {
        column: "type_tags",
        value: e.to_string(),
    })
}

/// The library table behind the [`Catalog`] interface.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<LibraryDomain>, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT {LIBRARY_COLUMNS} FROM library_domains WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(entry_from_row).transpose()
    }

    /// Every entry, ordered by domain.
    pub async fn list(&self) -> Result<Vec<LibraryDomain>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {LIBRARY_COLUMNS} FROM library_domains ORDER BY domain"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(entry_from_row).collect()
    }

    /// Set of catalogued domains, for rollup membership tests.
    pub async fn domains(&self) -> Result<HashSet<String>, DatabaseError> {
        let domains: Vec<String> = sqlx::query_scalar("SELECT domain FROM library_domains")
            .fetch_all(&self.pool)
            .await?;
        Ok(domains.into_iter().collect())
    }

    /// Operator edit of an entry. Returns `false` when no entry has that id.
    pub async fn update_entry(&self, entry: &LibraryDomain) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE library_domains
             SET domain = ?, display_name = ?, type_tags = ?, domain_type = ?, pricing_type = ?,
                 price_amount = ?, currency = ?, submission_url = ?, contact = ?, status = ?,
                 notes = ?, updated_at_ms = ?
             WHERE id = ?",
        )
        .bind(&entry.domain)
        .bind(&entry.display_name)
        .bind(encode_tags(&entry.type_tags)?)
        .bind(entry.domain_type.as_ref())
        .bind(entry.pricing_type.as_ref())
        .bind(entry.price_amount)
        .bind(&entry.currency)
        .bind(&entry.submission_url)
        .bind(&entry.contact)
        .bind(entry.status.as_ref())
        .bind(&entry.notes)
        .bind(entry.updated_at.timestamp_millis())
        .bind(&entry.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` when no entry has that id.
    pub async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM library_domains WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn find_by_domain(&self, domain: &str) -> Result<Option<LibraryDomain>, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT {LIBRARY_COLUMNS} FROM library_domains WHERE domain = ?"
        ))
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(entry_from_row).transpose()
    }

    async fn insert(&self, entry: &LibraryDomain) -> Result<InsertOutcome, DatabaseError> {
        let result = sqlx::query(&format!(
            "INSERT INTO library_domains ({LIBRARY_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(domain) DO NOTHING"
        ))
        .bind(&entry.id)
        .bind(&entry.domain)
        .bind(&entry.display_name)
        .bind(encode_tags(&entry.type_tags)?)
        .bind(entry.domain_type.as_ref())
        .bind(entry.pricing_type.as_ref())
        .bind(entry.price_amount)
        .bind(&entry.currency)
        .bind(&entry.submission_url)
        .bind(&entry.contact)
        .bind(entry.status.as_ref())
        .bind(&entry.notes)
        .bind(entry.created_at.timestamp_millis())
        .bind(entry.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(if result.rows_affected() > 0 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::AlreadyExists
        })
    }

    async fn update(&self, entry: &LibraryDomain) -> Result<(), DatabaseError> {
        if self.update_entry(entry).await? {
            Ok(())
        } else {
            Err(DatabaseError::SqlError(sqlx::Error::RowNotFound))
        }
    }
}
