//! Catalog reconciliation.
//!
//! Two deliberately separate write paths touch the catalog:
//! - [`sync`] runs at import time and only ever creates missing entries
//! - [`export_to_library`] applies operator choices and updates existing entries
//!
//! Keeping them apart guarantees an automatic import never clobbers
//! operator-edited pricing, status or notes.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use log::{debug, info};

use super::catalog::{Catalog, InsertOutcome};
use super::types::{ExportPreviewItem, ExportSelection, LibraryDomain};
use crate::error_handling::DatabaseError;
use crate::rollup::{sort_by_authority, DomainSummary};

/// Outcome of an automatic sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: usize,
    pub already_present: usize,
}

/// Outcome of a bulk export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub created: usize,
    pub updated: usize,
}

/// Creates catalog entries for every discovered domain not yet catalogued.
///
/// Existing entries are left untouched, so running this twice with the same
/// domains changes nothing on the second run.
///
/// # Errors
///
/// Returns the first catalog error; entries inserted before it stay.
pub async fn sync<C: Catalog + ?Sized>(
    discovered: &BTreeSet<String>,
    source_file: &str,
    catalog: &C,
    now: DateTime<Utc>,
) -> Result<SyncReport, DatabaseError> {
    let mut report = SyncReport::default();

    for domain in discovered {
        if catalog.find_by_domain(domain).await?.is_some() {
            report.already_present += 1;
            continue;
        }
        let entry = LibraryDomain::discovered(domain, source_file, now);
        match catalog.insert(&entry).await? {
            InsertOutcome::Inserted => report.inserted += 1,
            InsertOutcome::AlreadyExists => {
                debug!("Library entry for {} appeared concurrently, keeping it", domain);
                report.already_present += 1;
            }
        }
    }

    info!(
        "Library sync for {}: {} new, {} already catalogued",
        source_file, report.inserted, report.already_present
    );
    Ok(report)
}

/// Applies operator-selected pricing, status and notes to the catalog.
///
/// Missing domains are created with the chosen values; existing entries get
/// those three fields overwritten and everything else kept.
///
/// # Errors
///
/// Returns the first catalog error; selections applied before it stay.
pub async fn export_to_library<C: Catalog + ?Sized>(
    selections: &[ExportSelection],
    catalog: &C,
    now: DateTime<Utc>,
) -> Result<ExportReport, DatabaseError> {
    let mut report = ExportReport::default();

    for selection in selections {
        if let Some(existing) = catalog.find_by_domain(&selection.domain).await? {
            catalog.update(&apply(existing, selection, now)).await?;
            report.updated += 1;
            continue;
        }

        let entry = apply(LibraryDomain::new(&selection.domain, now), selection, now);
        match catalog.insert(&entry).await? {
            InsertOutcome::Inserted => report.created += 1,
            InsertOutcome::AlreadyExists => {
                // Lost a race with another writer; the operator's choice still wins
                match catalog.find_by_domain(&selection.domain).await? {
                    Some(existing) => {
                        catalog.update(&apply(existing, selection, now)).await?;
                        report.updated += 1;
                    }
                    None => debug!("{} vanished during export, skipped", selection.domain),
                }
            }
        }
    }

    info!(
        "Exported {} domains to library ({} created, {} updated)",
        selections.len(),
        report.created,
        report.updated
    );
    Ok(report)
}

fn apply(mut entry: LibraryDomain, selection: &ExportSelection, now: DateTime<Utc>) -> LibraryDomain {
    entry.pricing_type = selection.pricing_type;
    entry.status = selection.status;
    entry.notes = selection.notes.clone();
    entry.updated_at = now;
    entry
}

/// Builds the export preview for a snapshot's rollup.
///
/// Domains are ranked by authority score (highest first, ties by domain) and
/// cut to `limit`. Catalogued domains carry their current values and start
/// unselected; new ones start selected with default values.
///
/// # Errors
///
/// Returns the first catalog lookup error.
pub async fn preview_export<C: Catalog + ?Sized>(
    summaries: &[DomainSummary<'_>],
    catalog: &C,
    limit: usize,
) -> Result<Vec<ExportPreviewItem>, DatabaseError> {
    let mut ranked = summaries.to_vec();
    sort_by_authority(&mut ranked);

    let mut items = Vec::with_capacity(ranked.len().min(limit));
    for summary in ranked.iter().take(limit) {
        let existing = catalog.find_by_domain(summary.domain).await?;
        let item = match existing {
            Some(entry) => ExportPreviewItem {
                domain: summary.domain.to_string(),
                authority_score: summary.authority_score,
                link_count: summary.link_count,
                is_existing: true,
                pricing_type: entry.pricing_type,
                status: entry.status,
                notes: entry.notes,
                selected: false,
            },
            None => ExportPreviewItem {
                domain: summary.domain.to_string(),
                authority_score: summary.authority_score,
                link_count: summary.link_count,
                is_existing: false,
                pricing_type: Default::default(),
                status: Default::default(),
                notes: None,
                selected: true,
            },
        };
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::catalog::memory::MemoryCatalog;
    use crate::library::types::{LinkStatus, PricingType};
    use crate::models::BacklinkRecord;
    use crate::rollup::rollup;
    use std::collections::HashSet;

    fn domains(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|d| d.to_string()).collect()
    }

    fn record(domain: &str, authority: f64) -> BacklinkRecord {
        BacklinkRecord {
            source_page_url: format!("https://{domain}/"),
            referring_domain: domain.to_string(),
            target_url: String::new(),
            first_discovered_at: None,
            last_seen_at: None,
            anchor_text: None,
            is_nofollow: false,
            is_ugc: false,
            is_sponsored: false,
            domain_authority_score: authority,
            url_rating: 0.0,
            domain_traffic: 0.0,
            page_traffic: 0.0,
            external_link_count: 0,
            language: None,
        }
    }

    #[tokio::test]
    async fn test_sync_creates_missing_entries() {
        let catalog = MemoryCatalog::default();
        let report = sync(&domains(&["a.example", "b.example"]), "s.csv", &catalog, Utc::now())
            .await
            .unwrap();

        assert_eq!(report, SyncReport { inserted: 2, already_present: 0 });
        let entries = catalog.snapshot();
        assert_eq!(
            entries["a.example"].notes.as_deref(),
            Some("Auto-imported from snapshot s.csv")
        );
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let catalog = MemoryCatalog::default();
        let discovered = domains(&["a.example", "b.example", "c.example"]);

        sync(&discovered, "first.csv", &catalog, Utc::now()).await.unwrap();
        let after_first = catalog.snapshot();

        let report = sync(&discovered, "second.csv", &catalog, Utc::now())
            .await
            .unwrap();
        assert_eq!(report, SyncReport { inserted: 0, already_present: 3 });
        assert_eq!(catalog.snapshot(), after_first);
    }

    #[tokio::test]
    async fn test_sync_never_overwrites_edited_fields() {
        let catalog = MemoryCatalog::default();
        let mut edited = LibraryDomain::new("a.example", Utc::now());
        edited.pricing_type = PricingType::Paid;
        edited.status = LinkStatus::Live;
        edited.notes = Some("negotiated".to_string());
        catalog.insert(&edited).await.unwrap();

        sync(&domains(&["a.example"]), "later.csv", &catalog, Utc::now())
            .await
            .unwrap();

        assert_eq!(catalog.snapshot()["a.example"], edited);
    }

    #[tokio::test]
    async fn test_export_creates_and_updates() {
        let catalog = MemoryCatalog::default();
        let existing = LibraryDomain::discovered("old.example", "s.csv", Utc::now());
        catalog.insert(&existing).await.unwrap();

        let selections = vec![
            ExportSelection {
                domain: "old.example".to_string(),
                pricing_type: PricingType::Free,
                status: LinkStatus::Submitted,
                notes: Some("sent form".to_string()),
            },
            ExportSelection {
                domain: "new.example".to_string(),
                pricing_type: PricingType::Paid,
                status: LinkStatus::NotTried,
                notes: None,
            },
        ];
        let report = export_to_library(&selections, &catalog, Utc::now())
            .await
            .unwrap();
        assert_eq!(report, ExportReport { created: 1, updated: 1 });

        let entries = catalog.snapshot();
        let old = &entries["old.example"];
        assert_eq!(old.id, existing.id);
        assert_eq!(old.created_at, existing.created_at);
        assert_eq!(old.pricing_type, PricingType::Free);
        assert_eq!(old.status, LinkStatus::Submitted);
        assert_eq!(old.notes.as_deref(), Some("sent form"));

        assert_eq!(entries["new.example"].pricing_type, PricingType::Paid);
        assert_eq!(catalog.len(), 2);
    }

    // Reports every domain as taken but never returns it, as when another
    // writer deletes the entry between the insert and the re-lookup.
    #[derive(Default)]
    struct VanishingCatalog {
        updates: std::sync::Mutex<usize>,
    }

    #[async_trait::async_trait]
    impl Catalog for VanishingCatalog {
        async fn find_by_domain(
            &self,
            _domain: &str,
        ) -> Result<Option<LibraryDomain>, DatabaseError> {
            Ok(None)
        }

        async fn insert(&self, _entry: &LibraryDomain) -> Result<InsertOutcome, DatabaseError> {
            Ok(InsertOutcome::AlreadyExists)
        }

        async fn update(&self, _entry: &LibraryDomain) -> Result<(), DatabaseError> {
            *self.updates.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_export_does_not_count_entries_deleted_mid_export() {
        let catalog = VanishingCatalog::default();
        let selections = vec![ExportSelection {
            domain: "gone.example".to_string(),
            pricing_type: PricingType::Paid,
            status: LinkStatus::Submitted,
            notes: None,
        }];

        let report = export_to_library(&selections, &catalog, Utc::now())
            .await
            .unwrap();
        assert_eq!(report, ExportReport::default());
        assert_eq!(*catalog.updates.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_preview_ranks_and_preselects() {
        let catalog = MemoryCatalog::default();
        let mut known = LibraryDomain::new("mid.example", Utc::now());
        known.status = LinkStatus::Live;
        catalog.insert(&known).await.unwrap();

        let records = vec![
            record("low.example", 10.0),
            record("mid.example", 50.0),
            record("top.example", 80.0),
            record("top.example", 80.0),
        ];
        let summaries = rollup(&records, &HashSet::new());
        let preview = preview_export(&summaries, &catalog, 2).await.unwrap();

        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0].domain, "top.example");
        assert_eq!(preview[0].link_count, 2);
        assert!(preview[0].selected);
        assert!(!preview[0].is_existing);

        assert_eq!(preview[1].domain, "mid.example");
        assert!(preview[1].is_existing);
        assert!(!preview[1].selected);
        assert_eq!(preview[1].status, LinkStatus::Live);
    }
}
