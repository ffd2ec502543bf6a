//! Registry facade.

use crate::catalog::{CollectionCatalog, Records};
use crate::config::Config;
use crate::connection::{Connection, ConnectionResolver};
use crate::error::{CoreError, CoreResult};
use crate::identity::IdentityAllocator;
use crate::index::UniquenessIndex;
use crate::model::Model;
use crate::record::Record;
use crate::schema::{PropertyDescriptor, SchemaRegistry};
use crate::stats::RegistryStats;
use crate::types::{ModelId, TypeName};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The main kvrecord handle.
///
/// `Registry` owns every piece of shared state: the schemas of all model
/// types, the connection overrides and the statistics. It is created once
/// and shared by `Arc`; records and model handles keep it alive. Nothing
/// is global, so independent registries (one per test, say) never see
/// each other's types.
///
/// # Example
///
/// ```rust,ignore
/// use kvrecord_backend::InMemoryBackend;
/// use kvrecord_core::{Connection, Registry};
///
/// let registry = Registry::new(Connection::new(InMemoryBackend::new()));
/// let users = registry.define_model("User", None)?;
/// users.declare_property("name", [])?;
/// users.declare_property("email", [("searchable", true)])?;
///
/// let mut user = users.new_record();
/// user.set("email", "steve@example.com")?;
///
/// let found = users.find_by_property("email", "steve@example.com")?;
/// assert_eq!(found.as_ref(), Some(&user));
/// ```
pub struct Registry {
    /// Configuration.
    config: Config,
    /// Model schemas.
    schemas: SchemaRegistry,
    /// Connection overrides.
    connections: ConnectionResolver,
    /// Operation counters.
    stats: RegistryStats,
}

impl Registry {
    /// Creates a registry with the default configuration.
    pub fn new(default_connection: Connection) -> Arc<Self> {
        Self::with_config(default_connection, Config::default())
    }

    /// Creates a registry with a custom configuration.
    pub fn with_config(default_connection: Connection, config: Config) -> Arc<Self> {
        debug!(connection = default_connection.name(), ?config, "registry created");
        Arc::new(Self {
            config,
            schemas: SchemaRegistry::new(),
            connections: ConnectionResolver::new(default_connection),
            stats: RegistryStats::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the operation counters.
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Returns the schema registry.
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Defines a model type and returns a handle to it.
    ///
    /// Properties and connection overrides of `parent` are inherited.
    /// Defining the same type again with the same parent returns a
    /// handle to the existing type.
    pub fn define_model(
        self: &Arc<Self>,
        name: impl AsRef<str>,
        parent: Option<&str>,
    ) -> CoreResult<Model> {
        let name = TypeName::new(name);
        let parent = parent.map(TypeName::new);
        self.schemas.define(&name, parent.as_ref())?;
        Ok(Model::new(Arc::clone(self), name))
    }

    /// Returns a handle to an already defined model type.
    pub fn model(self: &Arc<Self>, name: impl AsRef<str>) -> CoreResult<Model> {
        let name = TypeName::new(name);
        if !self.schemas.contains(&name) {
            return Err(CoreError::unknown_type(name.as_str()));
        }
        Ok(Model::new(Arc::clone(self), name))
    }

    /// Declares a property on a model type.
    ///
    /// The only recognized option is `searchable`.
    pub fn declare_property<'a, I>(
        &self,
        model: &TypeName,
        name: &str,
        options: I,
    ) -> CoreResult<PropertyDescriptor>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        self.schemas.declare(model, name, options)
    }

    /// Returns every property of a model type, `id` first.
    pub fn properties_of(&self, model: &TypeName) -> CoreResult<Vec<PropertyDescriptor>> {
        self.schemas.properties_of(model)
    }

    /// Returns the default connection.
    pub fn default_connection(&self) -> Connection {
        self.connections.default_connection()
    }

    /// Replaces the default connection.
    pub fn set_default_connection(&self, connection: Connection) {
        self.connections.set_default_connection(connection);
    }

    /// Resolves the connection of a model type.
    pub fn connection_for(&self, model: &TypeName) -> CoreResult<Connection> {
        self.connections.connection_for(&self.schemas, model)
    }

    /// Sets the connection override of exactly this type, or clears it
    /// with `None`.
    pub fn set_connection_for(
        &self,
        model: &TypeName,
        connection: Option<Connection>,
    ) -> CoreResult<()> {
        if !self.schemas.contains(model) {
            return Err(CoreError::unknown_type(model.as_str()));
        }
        self.connections.set_override(model, connection);
        Ok(())
    }

    /// Creates an in-memory record with no id.
    pub fn new_record(self: &Arc<Self>, model: &TypeName) -> CoreResult<Record> {
        if !self.schemas.contains(model) {
            return Err(CoreError::unknown_type(model.as_str()));
        }
        Ok(Record::new(Arc::clone(self), model.clone()))
    }

    /// Returns the record with `id` if its existence marker is present.
    pub fn find(self: &Arc<Self>, model: &TypeName, id: ModelId) -> CoreResult<Option<Record>> {
        let storage = self.schemas.storage_name(model)?;
        let connection = self.connection_for(model)?;
        self.stats.record_lookup();

        let allocator = IdentityAllocator::new(
            &connection,
            model,
            &storage,
            self.config.catalog,
            &self.stats,
        );
        if !allocator.exists(id)? {
            return Ok(None);
        }
        Ok(Some(Record::hydrate(Arc::clone(self), model.clone(), id)))
    }

    /// Returns the record owning `value` of a searchable property.
    ///
    /// The record carries only its id. Returns `None` if nobody claimed
    /// the value.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnknownAttribute`] if the property is not declared
    /// - [`CoreError::NotSearchable`] if it is not searchable
    pub fn find_by_property(
        self: &Arc<Self>,
        model: &TypeName,
        property: &str,
        value: &str,
    ) -> CoreResult<Option<Record>> {
        let descriptor = self
            .schemas
            .descriptor(model, property)?
            .ok_or_else(|| CoreError::unknown_attribute(model.as_str(), property))?;
        if !descriptor.is_searchable() {
            return Err(CoreError::NotSearchable {
                model: model.to_string(),
                property: property.to_string(),
            });
        }

        let storage = self.schemas.storage_name(model)?;
        let connection = self.connection_for(model)?;
        self.stats.record_lookup();

        let owner = UniquenessIndex::new(&connection, model, &storage, &self.stats)
            .owner(property, value)?;
        Ok(owner.map(|id| Record::hydrate(Arc::clone(self), model.clone(), id)))
    }

    /// Enumerates the records of a type in catalog order.
    ///
    /// The id list is read eagerly; records are built lazily and load
    /// their properties on first access.
    pub fn all_of(self: &Arc<Self>, model: &TypeName) -> CoreResult<Records> {
        let storage = self.schemas.storage_name(model)?;
        let connection = self.connection_for(model)?;
        self.stats.record_lookup();

        let ids = CollectionCatalog::new(connection, &storage, self.config.catalog).ids()?;
        Ok(Records::new(Arc::clone(self), model.clone(), ids))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("schemas", &self.schemas)
            .field("connections", &self.connections)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvrecord_backend::InMemoryBackend;

    fn registry() -> Arc<Registry> {
        Registry::new(Connection::new(InMemoryBackend::new()))
    }

    #[test]
    fn define_and_lookup_models() {
        let registry = registry();
        registry.define_model("User", None).unwrap();
        registry.define_model("Admin", Some("User")).unwrap();

        assert_eq!(registry.model("Admin").unwrap().name().as_str(), "Admin");
        assert!(matches!(
            registry.model("Ghost"),
            Err(CoreError::UnknownType { .. })
        ));
        assert!(matches!(
            registry.define_model("Orphan", Some("Ghost")),
            Err(CoreError::UnknownType { .. })
        ));
    }

    #[test]
    fn independent_registries_do_not_share_types() {
        let a = registry();
        let b = registry();
        a.define_model("User", None).unwrap();

        assert!(a.model("User").is_ok());
        assert!(b.model("User").is_err());
    }

    #[test]
    fn find_requires_existence_marker() {
        let registry = registry();
        let users = registry.define_model("User", None).unwrap();
        let mut user = users.new_record();
        let id = user.id().unwrap();

        assert_eq!(registry.find(users.name(), id).unwrap().as_ref(), Some(&user));
        assert!(registry.find(users.name(), ModelId::new(99)).unwrap().is_none());
    }

    #[test]
    fn find_by_property_checks_declaration() {
        let registry = registry();
        let users = registry.define_model("User", None).unwrap();
        users.declare_property("name", []).unwrap();

        assert!(matches!(
            registry.find_by_property(users.name(), "name", "x"),
            Err(CoreError::NotSearchable { .. })
        ));
        assert!(matches!(
            registry.find_by_property(users.name(), "nickname", "x"),
            Err(CoreError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn set_connection_for_unknown_type_fails() {
        let registry = registry();
        assert!(matches!(
            registry.set_connection_for(
                &TypeName::new("Ghost"),
                Some(Connection::new(InMemoryBackend::new()))
            ),
            Err(CoreError::UnknownType { .. })
        ));
    }

    #[test]
    fn lookups_are_counted() {
        let registry = registry();
        let users = registry.define_model("User", None).unwrap();
        users.all().unwrap();
        users.find(ModelId::new(1)).unwrap();

        assert_eq!(registry.stats().lookups(), 2);
    }
}
