//! Records and the generic accessor path.
//!
//! A record is an in-memory instance of a model type. It gets an id the
//! first time persistence needs one, caches property values it has read
//! or written, and routes every access through a single name-keyed
//! dispatch checked against the schema.
//!
//! A record is not meant to be mutated from several threads at once; the
//! backend is the only shared state.

use crate::attributes::AttributeStore;
use crate::connection::Connection;
use crate::error::{CoreError, CoreResult};
use crate::identity::IdentityAllocator;
use crate::index::UniquenessIndex;
use crate::registry::Registry;
use crate::schema::{PropertyDescriptor, ID_PROPERTY};
use crate::types::{ModelId, TypeName};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// An instance of a model type.
///
/// Two records are equal when they have the same type and the same
/// assigned id. A record without an id equals nothing, itself included.
pub struct Record {
    registry: Arc<Registry>,
    model: TypeName,
    id: Option<ModelId>,
    /// Values read from or written to the backend.
    cache: HashMap<String, String>,
    /// Instance-level connection override.
    connection: Option<Connection>,
}

impl Record {
    pub(crate) fn new(registry: Arc<Registry>, model: TypeName) -> Self {
        Self {
            registry,
            model,
            id: None,
            cache: HashMap::new(),
            connection: None,
        }
    }

    /// Builds a record for an id found in the backend.
    ///
    /// This is the only way an id is assigned other than allocation.
    pub(crate) fn hydrate(registry: Arc<Registry>, model: TypeName, id: ModelId) -> Self {
        let mut record = Self::new(registry, model);
        record.id = Some(id);
        record
    }

    /// Returns the model type.
    pub fn model(&self) -> &TypeName {
        &self.model
    }

    /// Returns the id, allocating one on first call.
    ///
    /// Allocation increments `{type}:counter`, writes the existence marker
    /// and registers the id in the catalog. Later calls return the same id
    /// without touching the backend.
    pub fn id(&mut self) -> CoreResult<ModelId> {
        if let Some(id) = self.id {
            return Ok(id);
        }

        let connection = self.connection()?;
        let storage = self.storage_name()?;
        let id = IdentityAllocator::new(
            &connection,
            &self.model,
            &storage,
            self.registry.config().catalog,
            self.registry.stats(),
        )
        .allocate()?;
        self.id = Some(id);
        Ok(id)
    }

    /// Returns the id if one is assigned, without allocating.
    pub fn assigned_id(&self) -> Option<ModelId> {
        self.id
    }

    /// Returns true if the record has an id.
    pub fn persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Reads a property.
    ///
    /// `"id"` allocates an id if needed. Other properties come from the
    /// local cache, else from the backend. A record without an id has
    /// nothing stored and reads `None` for anything it has not set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownAttribute`] if `name` is not declared.
    pub fn get(&mut self, name: &str) -> CoreResult<Option<String>> {
        let descriptor = self.descriptor(name)?;
        if descriptor.is_id() {
            return Ok(Some(self.id()?.to_string()));
        }

        if let Some(value) = self.cache.get(name) {
            return Ok(Some(value.clone()));
        }
        let Some(id) = self.id else {
            return Ok(None);
        };

        let value = self.with_store(id, |store| store.read(name))?;
        if let Some(value) = &value {
            self.cache.insert(name.to_string(), value.clone());
        }
        Ok(value)
    }

    /// Writes a property.
    ///
    /// Allocates an id if needed. For a searchable property the value is
    /// claimed in the uniqueness index first and the claim on the value
    /// currently stored in the backend is released; on conflict nothing
    /// is written.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoSuchAccessor`] for `"id"`, which cannot be set
    /// - [`CoreError::UnknownAttribute`] if `name` is not declared
    /// - [`CoreError::NotUnique`] if another record owns the value
    pub fn set(&mut self, name: &str, value: impl AsRef<str>) -> CoreResult<()> {
        let value = value.as_ref();
        if name == ID_PROPERTY {
            return Err(CoreError::NoSuchAccessor {
                model: self.model.to_string(),
                accessor: format!("{ID_PROPERTY}="),
            });
        }
        let descriptor = self.descriptor(name)?;
        let id = self.id()?;

        if descriptor.is_searchable() {
            // Another handle may have changed the value since it was cached.
            let previous = self.with_store(id, |store| store.read(name))?;
            let connection = self.connection()?;
            let storage = self.storage_name()?;
            UniquenessIndex::new(&connection, &self.model, &storage, self.registry.stats()).claim(
                name,
                value,
                id,
                previous.as_deref(),
                self.registry.config().conditional_claims,
            )?;
        }

        self.with_store(id, |store| store.write(name, value))?;
        self.cache.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Sets each pair in order through [`Record::set`].
    ///
    /// Stops at the first error. Earlier pairs stay written.
    pub fn assign_attributes<I, K, V>(&mut self, attributes: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in attributes {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Returns true if the property has a non-empty value.
    ///
    /// Undeclared names are never present. `"id"` is present once assigned.
    pub fn attribute_present(&mut self, name: &str) -> CoreResult<bool> {
        if name == ID_PROPERTY {
            return Ok(self.id.is_some());
        }
        if !self.has_attribute(name) {
            return Ok(false);
        }
        Ok(self.get(name)?.is_some_and(|v| !v.is_empty()))
    }

    /// Returns true if the type declares `name` (or it is `"id"`).
    pub fn has_attribute(&self, name: &str) -> bool {
        matches!(
            self.registry.schemas().descriptor(&self.model, name),
            Ok(Some(_))
        )
    }

    /// Returns every property name of the type, `"id"` first.
    pub fn property_names(&self) -> CoreResult<Vec<String>> {
        Ok(self
            .registry
            .properties_of(&self.model)?
            .iter()
            .map(|p| p.name().to_string())
            .collect())
    }

    /// Same as [`Record::property_names`].
    pub fn attribute_names(&self) -> CoreResult<Vec<String>> {
        self.property_names()
    }

    /// Drops cached values so the next reads go to the backend.
    pub fn reload(&mut self) {
        self.cache.clear();
    }

    /// Deletes the record from the backend.
    ///
    /// Releases the uniqueness claims the record still owns on its stored
    /// values (unless disabled in the config), removes the existence marker and catalog
    /// membership, then deletes the stored property values. A record that
    /// never got an id has nothing stored and is simply dropped.
    pub fn destroy(self) -> CoreResult<()> {
        let Some(id) = self.id else {
            return Ok(());
        };

        let connection = self.connection()?;
        let storage = self.storage_name()?;
        let properties = self.registry.properties_of(&self.model)?;
        let config = self.registry.config();
        let stats = self.registry.stats();
        let store = AttributeStore::new(&connection, &storage, id, config.layout, stats);

        if config.release_claims_on_destroy {
            let index = UniquenessIndex::new(&connection, &self.model, &storage, stats);
            for property in properties.iter().filter(|p| p.is_searchable()) {
                if let Some(value) = store.read(property.name())? {
                    index.release(property.name(), &value, id)?;
                }
            }
        }

        IdentityAllocator::new(&connection, &self.model, &storage, config.catalog, stats)
            .retire(id)?;
        store.clear(
            properties
                .iter()
                .filter(|p| !p.is_id())
                .map(PropertyDescriptor::name),
        )?;

        stats.record_destroy();
        debug!(model = %self.model, id = %id, "destroyed record");
        Ok(())
    }

    /// Returns the connection of this record.
    ///
    /// An instance-level override wins; otherwise the type's connection is
    /// resolved anew on every call.
    pub fn connection(&self) -> CoreResult<Connection> {
        match &self.connection {
            Some(connection) => Ok(connection.clone()),
            None => self.registry.connection_for(&self.model),
        }
    }

    /// Sets or clears the instance-level connection override.
    pub fn set_connection(&mut self, connection: Option<Connection>) {
        self.connection = connection;
    }

    fn descriptor(&self, name: &str) -> CoreResult<PropertyDescriptor> {
        self.registry
            .schemas()
            .descriptor(&self.model, name)?
            .ok_or_else(|| CoreError::unknown_attribute(self.model.as_str(), name))
    }

    fn storage_name(&self) -> CoreResult<String> {
        self.registry.schemas().storage_name(&self.model)
    }

    fn with_store<T>(
        &self,
        id: ModelId,
        f: impl FnOnce(&AttributeStore<'_>) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let connection = self.connection()?;
        let storage = self.storage_name()?;
        let store = AttributeStore::new(
            &connection,
            &storage,
            id,
            self.registry.config().layout,
            self.registry.stats(),
        );
        f(&store)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b && self.model == other.model,
            _ => false,
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &self.model)
            .field("id", &self.id)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AttributeLayout, Config};
    use crate::model::Model;
    use kvrecord_backend::{InMemoryBackend, KvBackend};

    fn setup(config: Config) -> (Connection, Model) {
        let connection = Connection::new(InMemoryBackend::new());
        let registry = Registry::with_config(connection.clone(), config);
        let model = registry.define_model("TestClass", None).unwrap();
        model.property("name").unwrap();
        model.searchable("email").unwrap();
        (connection, model)
    }

    #[test]
    fn id_is_allocated_once() {
        let (connection, model) = setup(Config::default());
        let mut record = model.new_record();
        assert!(!record.persisted());

        let id = record.id().unwrap();
        assert_eq!(record.id().unwrap(), id);
        assert!(record.persisted());
        assert_eq!(connection.get("test_class:counter").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn read_without_id_does_not_allocate() {
        let (connection, model) = setup(Config::default());
        let mut record = model.new_record();

        assert_eq!(record.get("name").unwrap(), None);
        assert!(!record.persisted());
        assert!(!connection.exists("test_class:counter").unwrap());
    }

    #[test]
    fn get_id_allocates() {
        let (_, model) = setup(Config::default());
        let mut record = model.new_record();
        assert_eq!(record.get("id").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn set_writes_hash_field() {
        let (connection, model) = setup(Config::default());
        let mut record = model.new_record();
        record.set("name", "Test Name").unwrap();

        assert_eq!(
            connection.hget("test_class:id:1:hash", "name").unwrap().as_deref(),
            Some("Test Name")
        );
    }

    #[test]
    fn keys_layout_writes_per_property_key() {
        let (connection, model) = setup(Config::new().layout(AttributeLayout::Keys));
        let mut record = model.new_record();
        record.set("name", "Test Name").unwrap();

        assert_eq!(
            connection.get("test_class:id:1:name").unwrap().as_deref(),
            Some("Test Name")
        );
    }

    #[test]
    fn get_reads_backend_once() {
        let (connection, model) = setup(Config::default());
        connection.set("test_class:id:3", "3").unwrap();
        connection
            .hset("test_class:id:3:hash", "name", "Test Name")
            .unwrap();

        let mut record = model.find(ModelId::new(3)).unwrap().unwrap();
        assert_eq!(record.get("name").unwrap().as_deref(), Some("Test Name"));

        connection
            .hset("test_class:id:3:hash", "name", "Changed")
            .unwrap();
        assert_eq!(record.get("name").unwrap().as_deref(), Some("Test Name"));

        record.reload();
        assert_eq!(record.get("name").unwrap().as_deref(), Some("Changed"));
    }

    #[test]
    fn id_cannot_be_set() {
        let (_, model) = setup(Config::default());
        let mut record = model.new_record();

        assert!(matches!(
            record.set("id", "7"),
            Err(CoreError::NoSuchAccessor { ref accessor, .. }) if accessor == "id="
        ));
        assert!(!record.persisted());
    }

    #[test]
    fn unknown_attributes_are_rejected() {
        let (_, model) = setup(Config::default());
        let mut record = model.new_record();

        assert!(matches!(
            record.set("nickname", "x"),
            Err(CoreError::UnknownAttribute { .. })
        ));
        assert!(matches!(
            record.get("nickname"),
            Err(CoreError::UnknownAttribute { .. })
        ));
        assert!(!record.attribute_present("nickname").unwrap());
    }

    #[test]
    fn attribute_presence() {
        let (_, model) = setup(Config::default());
        let mut record = model.new_record();

        assert!(!record.attribute_present("id").unwrap());
        assert!(!record.attribute_present("name").unwrap());
        record.set("name", "").unwrap();
        assert!(!record.attribute_present("name").unwrap());
        record.set("name", "steve").unwrap();
        assert!(record.attribute_present("name").unwrap());
        assert!(record.attribute_present("id").unwrap());
    }

    #[test]
    fn property_names_and_has_attribute() {
        let (_, model) = setup(Config::default());
        let record = model.new_record();

        assert_eq!(record.property_names().unwrap(), vec!["id", "name", "email"]);
        assert_eq!(record.attribute_names().unwrap(), record.property_names().unwrap());
        assert!(record.has_attribute("id"));
        assert!(record.has_attribute("email"));
        assert!(!record.has_attribute("nickname"));
    }

    #[test]
    fn equality_needs_assigned_ids() {
        let (_, model) = setup(Config::default());
        let a = model.new_record();
        let b = model.new_record();
        assert_ne!(a, b);
        assert!(!PartialEq::eq(&a, &a));

        let mut c = model.new_record();
        let id = c.id().unwrap();
        assert_eq!(model.find(id).unwrap().unwrap(), c);
    }

    #[test]
    fn conflicting_write_changes_nothing() {
        let (connection, model) = setup(Config::default());
        let mut first = model.new_record();
        first.set("email", "a@x").unwrap();
        let mut second = model.new_record();
        second.set("email", "b@x").unwrap();

        assert!(matches!(
            second.set("email", "a@x"),
            Err(CoreError::NotUnique { .. })
        ));
        assert_eq!(second.get("email").unwrap().as_deref(), Some("b@x"));
        assert_eq!(
            connection.hget("test_class:id:2:hash", "email").unwrap().as_deref(),
            Some("b@x")
        );
        assert_eq!(connection.get("test_class:email:a@x").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn changing_searchable_value_moves_claim() {
        let (connection, model) = setup(Config::default());
        let mut record = model.new_record();
        record.set("email", "a@x").unwrap();

        // A fresh handle has no cache and must find the old value in the backend.
        let mut fresh = model.find(record.id().unwrap()).unwrap().unwrap();
        fresh.set("email", "b@x").unwrap();

        assert!(!connection.exists("test_class:email:a@x").unwrap());
        assert_eq!(connection.get("test_class:email:b@x").unwrap().as_deref(), Some("1"));
        assert!(model.find_by_property("email", "a@x").unwrap().is_none());
    }

    #[test]
    fn stale_handle_set_releases_stored_claim() {
        let (connection, model) = setup(Config::default());
        let mut stale = model.new_record();
        stale.set("email", "a@x").unwrap();
        let id = stale.id().unwrap();

        let mut other = model.find(id).unwrap().unwrap();
        other.set("email", "b@x").unwrap();

        // The stale handle still caches a@x, but b@x is what is stored.
        stale.set("email", "c@x").unwrap();

        assert!(!connection.exists("test_class:email:a@x").unwrap());
        assert!(!connection.exists("test_class:email:b@x").unwrap());
        assert_eq!(connection.get("test_class:email:c@x").unwrap().as_deref(), Some("1"));
        model.new_record().set("email", "b@x").unwrap();
    }

    #[test]
    fn stale_handle_destroy_releases_stored_claim() {
        let (connection, model) = setup(Config::default());
        let mut stale = model.new_record();
        stale.set("email", "a@x").unwrap();
        let id = stale.id().unwrap();

        let mut other = model.find(id).unwrap().unwrap();
        other.set("email", "b@x").unwrap();

        stale.destroy().unwrap();

        assert!(model.find(id).unwrap().is_none());
        assert!(model.find_by_property("email", "b@x").unwrap().is_none());
        assert!(!connection.exists("test_class:email:b@x").unwrap());
        model.new_record().set("email", "b@x").unwrap();
    }

    #[test]
    fn destroy_removes_everything() {
        let (connection, model) = setup(Config::default());
        let mut record = model.new_record();
        record.set("name", "steve").unwrap();
        record.set("email", "s@x").unwrap();

        record.destroy().unwrap();

        assert!(!connection.exists("test_class:id:1").unwrap());
        assert!(!connection.exists("test_class:id:1:hash").unwrap());
        assert!(!connection.exists("test_class:email:s@x").unwrap());
        assert_eq!(model.all().unwrap().count(), 0);
        assert_eq!(model.registry().stats().destroys(), 1);
    }

    #[test]
    fn destroy_can_keep_claims() {
        let (connection, model) = setup(Config::new().release_claims_on_destroy(false));
        let mut record = model.new_record();
        record.set("email", "s@x").unwrap();

        record.destroy().unwrap();
        assert_eq!(connection.get("test_class:email:s@x").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn destroy_with_keys_layout_deletes_each_key() {
        let (connection, model) = setup(Config::new().layout(AttributeLayout::Keys));
        let mut record = model.new_record();
        record.set("name", "steve").unwrap();

        record.destroy().unwrap();
        assert!(!connection.exists("test_class:id:1:name").unwrap());
    }

    #[test]
    fn destroy_without_id_touches_nothing() {
        let (connection, model) = setup(Config::default());
        model.new_record().destroy().unwrap();
        assert!(!connection.exists("test_class:counter").unwrap());
    }

    #[test]
    fn instance_connection_override() {
        let (default, model) = setup(Config::default());
        let other = Connection::named("other", InMemoryBackend::new());
        let mut record = model.new_record();

        record.set_connection(Some(other.clone()));
        assert_eq!(record.connection().unwrap(), other);
        record.set("name", "steve").unwrap();
        assert_eq!(
            other.hget("test_class:id:1:hash", "name").unwrap().as_deref(),
            Some("steve")
        );
        assert!(!default.exists("test_class:counter").unwrap());

        record.set_connection(None);
        assert_eq!(record.connection().unwrap(), default);
    }

    #[test]
    fn type_override_is_seen_by_existing_records() {
        let (default, model) = setup(Config::default());
        let record = model.new_record();
        let other = Connection::named("other", InMemoryBackend::new());

        assert_eq!(record.connection().unwrap(), default);
        model.set_connection(Some(other.clone())).unwrap();
        assert_eq!(record.connection().unwrap(), other);
    }
}
