//! Identity allocation.
//!
//! Ids come from an atomic `INCR` on `{type}:counter`. The existence
//! marker and catalog registration follow as separate backend calls, so
//! an id can be allocated but not yet visible to `find` or `all`. A crash
//! between the calls leaves a gap in the sequence. This window is not
//! closed here.

use crate::catalog::CollectionCatalog;
use crate::config::CatalogKind;
use crate::connection::Connection;
use crate::error::{CoreError, CoreResult};
use crate::keys;
use crate::stats::RegistryStats;
use crate::types::{ModelId, TypeName};
use tracing::debug;

/// Allocates identifiers for one model type.
#[derive(Debug)]
pub struct IdentityAllocator<'a> {
    connection: &'a Connection,
    model: &'a TypeName,
    storage: &'a str,
    catalog: CatalogKind,
    stats: &'a RegistryStats,
}

impl<'a> IdentityAllocator<'a> {
    /// Creates an allocator view for a type.
    pub fn new(
        connection: &'a Connection,
        model: &'a TypeName,
        storage: &'a str,
        catalog: CatalogKind,
        stats: &'a RegistryStats,
    ) -> Self {
        Self {
            connection,
            model,
            storage,
            catalog,
            stats,
        }
    }

    /// Allocates a new id, marks it as existing and registers it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptEntry`] if the counter yields a value
    /// that is not a positive integer.
    pub fn allocate(&self) -> CoreResult<ModelId> {
        let counter = keys::counter(self.storage);
        let next = self.connection.incr(&counter)?;
        let id = u64::try_from(next)
            .ok()
            .filter(|n| *n > 0)
            .map(ModelId::new)
            .ok_or_else(|| CoreError::corrupt_entry(&counter, next.to_string()))?;

        let member = id.to_string();
        self.connection
            .set(&keys::existence(self.storage, id), &member)?;
        CollectionCatalog::new(self.connection.clone(), self.storage, self.catalog)
            .register(id)?;

        self.stats.record_allocation();
        debug!(model = %self.model, id = %id, connection = self.connection.name(), "allocated id");
        Ok(id)
    }

    /// Returns true if the existence marker for `id` is present.
    pub fn exists(&self, id: ModelId) -> CoreResult<bool> {
        Ok(self.connection.exists(&keys::existence(self.storage, id))?)
    }

    /// Removes the existence marker and catalog membership of `id`.
    pub fn retire(&self, id: ModelId) -> CoreResult<()> {
        self.connection.del(&keys::existence(self.storage, id))?;
        CollectionCatalog::new(self.connection.clone(), self.storage, self.catalog)
            .unregister(id)?;
        Ok(())
    }
}
