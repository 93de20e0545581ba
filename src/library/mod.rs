//! Outreach library: the cross-snapshot catalog of referring domains.
//!
//! This module provides:
//! - The catalog entry model (`LibraryDomain` and its enums)
//! - The `Catalog` store abstraction
//! - Create-if-missing sync run at import time
//! - Operator-driven bulk export with preview

mod catalog;
mod sync;
mod types;

// Re-export public API
pub use catalog::{Catalog, InsertOutcome};
pub use sync::{export_to_library, preview_export, sync, ExportReport, SyncReport};
pub use types::{
    DomainType, ExportPreviewItem, ExportSelection, LibraryDomain, LibraryUsageEdge, LinkStatus,
    PricingType,
};
