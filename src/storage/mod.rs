// storage/mod.rs
// SQLite storage for sites, snapshots, backlinks and the outreach library

mod backlinks;
mod library;
pub mod migrations;
pub mod pool;
mod sites;
mod snapshots;
mod utils;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use backlinks::{
    delete_backlinks_for_snapshot, insert_backlink_batch, library_usage, records_for_snapshot,
    snapshot_domains,
};
pub use library::SqliteCatalog;
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use sites::{
    delete_site, delete_site_if_empty, find_or_create_site, find_site_by_host, list_sites,
    SiteDeletion,
};
pub use snapshots::{get_snapshot, insert_snapshot, latest_snapshot, list_snapshots};
