//! Catalog store abstraction.

use async_trait::async_trait;

use super::types::LibraryDomain;
use crate::error_handling::DatabaseError;

/// Result of a create-if-missing insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another entry already owns the domain; nothing was written
    AlreadyExists,
}

/// Persistent catalog of library domains, keyed uniquely by canonical domain.
///
/// `insert` must treat the uniqueness of `domain` as authoritative: a second
/// insert for a domain already present reports [`InsertOutcome::AlreadyExists`]
/// instead of failing or overwriting.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_by_domain(&self, domain: &str) -> Result<Option<LibraryDomain>, DatabaseError>;

    async fn insert(&self, entry: &LibraryDomain) -> Result<InsertOutcome, DatabaseError>;

    /// Replaces the stored entry with the same `id`.
    async fn update(&self, entry: &LibraryDomain) -> Result<(), DatabaseError>;
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use super::*;

    /// Catalog held in memory, for exercising sync logic without SQLite.
    #[derive(Default)]
    pub(crate) struct MemoryCatalog {
        entries: Mutex<BTreeMap<String, LibraryDomain>>,
    }

    impl MemoryCatalog {
        pub(crate) fn snapshot(&self) -> BTreeMap<String, LibraryDomain> {
            self.entries.lock().unwrap().clone()
        }

        pub(crate) fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Catalog for MemoryCatalog {
        async fn find_by_domain(
            &self,
            domain: &str,
        ) -> Result<Option<LibraryDomain>, DatabaseError> {
            Ok(self.entries.lock().unwrap().get(domain).cloned())
        }

        async fn insert(&self, entry: &LibraryDomain) -> Result<InsertOutcome, DatabaseError> {
            let mut entries = self.entries.lock().unwrap();
            if entries.contains_key(&entry.domain) {
                return Ok(InsertOutcome::AlreadyExists);
            }
            entries.insert(entry.domain.clone(), entry.clone());
            Ok(InsertOutcome::Inserted)
        }

        async fn update(&self, entry: &LibraryDomain) -> Result<(), DatabaseError> {
            let mut entries = self.entries.lock().unwrap();
            entries.retain(|_, existing| existing.id != entry.id);
            entries.insert(entry.domain.clone(), entry.clone());
            Ok(())
        }
    }
}
