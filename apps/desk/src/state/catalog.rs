//! # Catalog State
//!
//! Autocomplete source for the entry form: an in-memory snapshot of the
//! database catalog, refreshed at startup and after every save (a purchase
//! can create medicines and batches).

use std::sync::{Arc, PoisonError, RwLock};

use medibill_core::InMemoryCatalog;
use medibill_db::{Database, DbResult};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    catalog: Arc<RwLock<InMemoryCatalog>>,
}

impl CatalogState {
    pub fn new(catalog: InMemoryCatalog) -> Self {
        CatalogState {
            catalog: Arc::new(RwLock::new(catalog)),
        }
    }

    /// Loads a snapshot from the database.
    pub async fn load(db: &Database) -> DbResult<Self> {
        Ok(CatalogState::new(db.catalog_snapshot().await?))
    }

    /// Executes a function with read access to the catalog.
    pub fn with_catalog<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&InMemoryCatalog) -> R,
    {
        let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        f(&catalog)
    }

    /// Replaces the snapshot with the database's current catalog and
    /// returns the number of medicines loaded.
    pub async fn refresh(&self, db: &Database) -> DbResult<usize> {
        let snapshot = db.catalog_snapshot().await?;
        let count = snapshot.medicine_count();

        let mut catalog = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        *catalog = snapshot;

        debug!(medicines = count, "Catalog snapshot refreshed");
        Ok(count)
    }
}
