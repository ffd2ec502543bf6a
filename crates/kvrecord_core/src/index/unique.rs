//! Value to owner claims for searchable properties.

use crate::connection::Connection;
use crate::error::{CoreError, CoreResult};
use crate::keys;
use crate::stats::RegistryStats;
use crate::types::{ModelId, TypeName};
use tracing::{debug, trace};

/// Claims of one model type, stored in the backend.
///
/// The index borrows its context from the caller and holds no state of
/// its own, so it is cheap to build per operation.
#[derive(Debug, Clone, Copy)]
pub struct UniquenessIndex<'a> {
    connection: &'a Connection,
    model: &'a TypeName,
    storage: &'a str,
    stats: &'a RegistryStats,
}

impl<'a> UniquenessIndex<'a> {
    /// Creates an index view for a type.
    pub fn new(
        connection: &'a Connection,
        model: &'a TypeName,
        storage: &'a str,
        stats: &'a RegistryStats,
    ) -> Self {
        Self {
            connection,
            model,
            storage,
            stats,
        }
    }

    /// Returns the record currently owning `value` of `property`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptEntry`] if the claim does not hold an id.
    pub fn owner(&self, property: &str, value: &str) -> CoreResult<Option<ModelId>> {
        self.owner_at(&keys::unique(self.storage, property, value))
    }

    fn owner_at(&self, key: &str) -> CoreResult<Option<ModelId>> {
        match self.connection.get(key)? {
            Some(raw) => ModelId::parse(&raw)
                .map(Some)
                .ok_or_else(|| CoreError::corrupt_entry(key, raw)),
            None => Ok(None),
        }
    }

    /// Claims `value` of `property` for `id`, then releases `previous`.
    ///
    /// A value already owned by `id` is left untouched. With
    /// `conditional` set the claim is written with `SETNX`, so of two
    /// writers racing for a free value exactly one wins. Without it the
    /// claim is a plain `SET` and the last writer wins.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotUnique`] if another record owns the value.
    /// Nothing is written in that case.
    pub fn claim(
        &self,
        property: &str,
        value: &str,
        id: ModelId,
        previous: Option<&str>,
        conditional: bool,
    ) -> CoreResult<()> {
        let key = keys::unique(self.storage, property, value);

        match self.owner_at(&key)? {
            Some(owner) if owner == id => {}
            Some(owner) => return Err(self.conflict(property, value, owner)),
            None => {
                let member = id.to_string();
                if conditional {
                    if !self.connection.set_nx(&key, &member)? {
                        // Lost the race between check and claim.
                        match self.owner_at(&key)? {
                            Some(owner) if owner == id => {}
                            Some(owner) => return Err(self.conflict(property, value, owner)),
                            None => {
                                return Err(CoreError::not_unique(
                                    self.model.as_str(),
                                    property,
                                    value,
                                ))
                            }
                        }
                    }
                } else {
                    self.connection.set(&key, &member)?;
                }
                self.stats.record_claim();
                debug!(model = %self.model, property, value, id = %id, "claimed value");
            }
        }

        if let Some(previous) = previous.filter(|p| *p != value) {
            self.release(property, previous, id)?;
        }
        Ok(())
    }

    /// Drops the claim on `value` of `property` if `id` owns it.
    ///
    /// Returns true if a claim was removed.
    pub fn release(&self, property: &str, value: &str, id: ModelId) -> CoreResult<bool> {
        let key = keys::unique(self.storage, property, value);
        match self.owner_at(&key) {
            Ok(Some(owner)) if owner == id => {}
            Ok(_) => return Ok(false),
            // A corrupt claim cannot belong to anyone.
            Err(CoreError::CorruptEntry { .. }) => return Ok(false),
            Err(err) => return Err(err),
        }

        let removed = self.connection.del(&key)?;
        if removed {
            self.stats.record_release();
            trace!(model = %self.model, property, value, id = %id, "released value");
        }
        Ok(removed)
    }

    fn conflict(&self, property: &str, value: &str, owner: ModelId) -> CoreError {
        self.stats.record_conflict();
        debug!(model = %self.model, property, value, owner = %owner, "value already claimed");
        CoreError::not_unique(self.model.as_str(), property, value)
    }
}
