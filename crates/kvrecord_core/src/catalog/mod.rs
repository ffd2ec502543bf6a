//! Collection catalog.
//!
//! Every allocated, not yet destroyed identifier of a type is a member
//! of `{type}:all`. The backing structure is chosen by [`CatalogKind`]:
//! a sorted set scored by id, a list in registration order, or a set.
//!
//! Sorted-set scores are doubles, so only ids up to 2^53 sort exactly.
//! Registering a larger id in a sorted-set catalog is refused.

mod records;

pub use records::Records;

use crate::config::CatalogKind;
use crate::connection::Connection;
use crate::error::{CoreError, CoreResult};
use crate::keys;
use crate::types::ModelId;

/// Largest id a sorted-set score represents exactly.
pub const MAX_SCORED_ID: u64 = 1 << 53;

/// Membership of all live identifiers of one type.
#[derive(Debug, Clone)]
pub struct CollectionCatalog {
    connection: Connection,
    key: String,
    kind: CatalogKind,
}

impl CollectionCatalog {
    /// Creates a catalog view for the type with the given key prefix.
    pub fn new(connection: Connection, storage: &str, kind: CatalogKind) -> Self {
        Self {
            connection,
            key: keys::catalog(storage),
            kind,
        }
    }

    /// Returns the backend key of the catalog.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Adds an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IdOutOfRange`] for a sorted-set catalog and an
    /// id above [`MAX_SCORED_ID`].
    pub fn register(&self, id: ModelId) -> CoreResult<()> {
        let member = id.to_string();
        match self.kind {
            CatalogKind::SortedSet => {
                if id.as_u64() > MAX_SCORED_ID {
                    return Err(CoreError::IdOutOfRange {
                        key: self.key.clone(),
                        id: id.as_u64(),
                    });
                }
                self.connection.zadd(&self.key, id.as_u64() as f64, &member)?;
            }
            CatalogKind::List => {
                self.connection.rpush(&self.key, &member)?;
            }
            CatalogKind::Set => {
                self.connection.sadd(&self.key, &member)?;
            }
        }
        Ok(())
    }

    /// Removes an identifier. Returns true if it was a member.
    pub fn unregister(&self, id: ModelId) -> CoreResult<bool> {
        let member = id.to_string();
        let removed = match self.kind {
            CatalogKind::SortedSet => self.connection.zrem(&self.key, &member)?,
            CatalogKind::List => self.connection.lrem(&self.key, 0, &member)? > 0,
            CatalogKind::Set => self.connection.srem(&self.key, &member)?,
        };
        Ok(removed)
    }

    /// Returns every registered identifier in backend order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptEntry`] if a member is not an identifier.
    pub fn ids(&self) -> CoreResult<Vec<ModelId>> {
        let members = match self.kind {
            CatalogKind::SortedSet => self.connection.zrange(&self.key, 0, -1)?,
            CatalogKind::List => self.connection.lrange(&self.key, 0, -1)?,
            CatalogKind::Set => self.connection.smembers(&self.key)?,
        };

        members
            .into_iter()
            .map(|m| ModelId::parse(&m).ok_or_else(|| CoreError::corrupt_entry(&self.key, m)))
            .collect()
    }
}
