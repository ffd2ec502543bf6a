//! Raw property value storage for one record.

use crate::config::AttributeLayout;
use crate::connection::Connection;
use crate::error::CoreResult;
use crate::keys;
use crate::stats::RegistryStats;
use crate::types::ModelId;
use tracing::trace;

/// Reads and writes the property values of one record.
///
/// With [`AttributeLayout::Hash`] every value is a field of
/// `{type}:id:{id}:hash`. With [`AttributeLayout::Keys`] each value has
/// its own key `{type}:id:{id}:{property}`.
#[derive(Debug)]
pub struct AttributeStore<'a> {
    connection: &'a Connection,
    storage: &'a str,
    id: ModelId,
    layout: AttributeLayout,
    stats: &'a RegistryStats,
}

impl<'a> AttributeStore<'a> {
    /// Creates a store view for the record `id`.
    pub fn new(
        connection: &'a Connection,
        storage: &'a str,
        id: ModelId,
        layout: AttributeLayout,
        stats: &'a RegistryStats,
    ) -> Self {
        Self {
            connection,
            storage,
            id,
            layout,
            stats,
        }
    }

    /// Reads the stored value of a property.
    pub fn read(&self, property: &str) -> CoreResult<Option<String>> {
        let value = match self.layout {
            AttributeLayout::Hash => self
                .connection
                .hget(&keys::attributes_hash(self.storage, self.id), property)?,
            AttributeLayout::Keys => self
                .connection
                .get(&keys::attribute(self.storage, self.id, property))?,
        };
        self.stats.record_read();
        Ok(value)
    }

    /// Writes the value of a property.
    pub fn write(&self, property: &str, value: &str) -> CoreResult<()> {
        match self.layout {
            AttributeLayout::Hash => {
                self.connection.hset(
                    &keys::attributes_hash(self.storage, self.id),
                    property,
                    value,
                )?;
            }
            AttributeLayout::Keys => {
                self.connection
                    .set(&keys::attribute(self.storage, self.id, property), value)?;
            }
        }
        self.stats.record_write();
        trace!(storage = self.storage, id = %self.id, property, "wrote property");
        Ok(())
    }

    /// Deletes every stored value.
    ///
    /// `properties` is only consulted for the per-key layout, which has no
    /// single key to delete.
    pub fn clear<'p, I>(&self, properties: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = &'p str>,
    {
        match self.layout {
            AttributeLayout::Hash => {
                self.connection
                    .del(&keys::attributes_hash(self.storage, self.id))?;
            }
            AttributeLayout::Keys => {
                for property in properties {
                    self.connection
                        .del(&keys::attribute(self.storage, self.id, property))?;
                }
            }
        }
        Ok(())
    }
}
