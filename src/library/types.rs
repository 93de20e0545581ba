//! Catalog entry model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::config::DEFAULT_CURRENCY;

/// How a catalog domain charges for a link.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    EnumIter,
    EnumString,
    AsRefStr,
    Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PricingType {
    Free,
    Paid,
    #[default]
    Unknown,
}

/// Outreach progress for a catalog domain.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    EnumIter,
    EnumString,
    AsRefStr,
    Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LinkStatus {
    #[default]
    NotTried,
    Submitted,
    Live,
    Rejected,
    Maintenance,
}

/// Kind of site behind a catalog domain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumIter, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DomainType {
    Blog,
    Directory,
    News,
    Forum,
    Other,
    #[default]
    Unknown,
}

/// One referring domain tracked as a reusable outreach resource.
///
/// `domain` is unique across the catalog. Pricing, status, notes and domain
/// type are operator-owned: automatic sync creates entries but never edits
/// them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryDomain {
    pub id: String,
    /// Canonical domain, the catalog key
    pub domain: String,
    pub display_name: Option<String>,
    pub type_tags: Vec<String>,
    pub domain_type: DomainType,
    pub pricing_type: PricingType,
    pub price_amount: Option<f64>,
    pub currency: String,
    pub submission_url: Option<String>,
    pub contact: Option<String>,
    pub status: LinkStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LibraryDomain {
    /// A blank entry for `domain` with every classification field unknown.
    pub fn new(domain: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            domain: domain.to_string(),
            display_name: None,
            type_tags: Vec::new(),
            domain_type: DomainType::default(),
            pricing_type: PricingType::default(),
            price_amount: None,
            currency: DEFAULT_CURRENCY.to_string(),
            submission_url: None,
            contact: None,
            status: LinkStatus::default(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Entry created by automatic sync, with a provenance note naming the report.
    pub fn discovered(domain: &str, source_file: &str, now: DateTime<Utc>) -> Self {
        Self {
            notes: Some(format!("Auto-imported from snapshot {source_file}")),
            ..Self::new(domain, now)
        }
    }
}

/// Operator-chosen values for one domain in a bulk export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSelection {
    pub domain: String,
    pub pricing_type: PricingType,
    pub status: LinkStatus,
    pub notes: Option<String>,
}

/// One row of the export-to-library preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPreviewItem {
    pub domain: String,
    pub authority_score: f64,
    pub link_count: u64,
    /// Already present in the catalog
    pub is_existing: bool,
    pub pricing_type: PricingType,
    pub status: LinkStatus,
    pub notes: Option<String>,
    /// Pre-selected when the domain is new to the catalog
    pub selected: bool,
}

impl ExportPreviewItem {
    pub fn to_selection(&self) -> ExportSelection {
        ExportSelection {
            domain: self.domain.clone(),
            pricing_type: self.pricing_type,
            status: self.status,
            notes: self.notes.clone(),
        }
    }
}

/// Per-site footprint of a catalog domain across all stored snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryUsageEdge {
    pub domain_id: String,
    pub site_id: String,
    pub count_backlinks: u64,
    pub last_seen: Option<DateTime<Utc>>,
}
