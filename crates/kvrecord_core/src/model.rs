//! Model type handles.

use crate::catalog::Records;
use crate::connection::Connection;
use crate::error::CoreResult;
use crate::record::Record;
use crate::registry::Registry;
use crate::schema::PropertyDescriptor;
use crate::types::{ModelId, TypeName};
use std::fmt;
use std::sync::Arc;

/// A handle to one model type of a [`Registry`].
///
/// Handles are cheap to clone and all share the registry's state.
#[derive(Clone)]
pub struct Model {
    registry: Arc<Registry>,
    name: TypeName,
}

impl Model {
    pub(crate) fn new(registry: Arc<Registry>, name: TypeName) -> Self {
        Self { registry, name }
    }

    /// Returns the type name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Returns the owning registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns the key prefix of this type.
    pub fn storage_name(&self) -> CoreResult<String> {
        self.registry.schemas().storage_name(&self.name)
    }

    /// Returns the parent type, if any.
    pub fn parent(&self) -> CoreResult<Option<Model>> {
        let schema = self.registry.schemas().schema(&self.name)?;
        Ok(schema
            .parent()
            .map(|p| Model::new(Arc::clone(&self.registry), p.clone())))
    }

    /// Defines a subtype of this model.
    pub fn define_subtype(&self, name: impl AsRef<str>) -> CoreResult<Model> {
        self.registry
            .define_model(name, Some(self.name.as_str()))
    }

    /// Declares a property.
    ///
    /// # Errors
    ///
    /// - [`crate::CoreError::InvalidPropertyOption`] for any option but `searchable`
    /// - [`crate::CoreError::PropertyExists`] if the name is taken
    pub fn declare_property<'a, I>(&self, name: &str, options: I) -> CoreResult<PropertyDescriptor>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        self.registry.declare_property(&self.name, name, options)
    }

    /// Declares a plain property.
    pub fn property(&self, name: &str) -> CoreResult<PropertyDescriptor> {
        self.declare_property(name, [])
    }

    /// Declares a searchable property.
    pub fn searchable(&self, name: &str) -> CoreResult<PropertyDescriptor> {
        self.declare_property(name, [("searchable", true)])
    }

    /// Returns every property, `id` first, then inherited, then own.
    pub fn properties(&self) -> CoreResult<Vec<PropertyDescriptor>> {
        self.registry.properties_of(&self.name)
    }

    /// Creates an in-memory record with no id.
    pub fn new_record(&self) -> Record {
        Record::new(Arc::clone(&self.registry), self.name.clone())
    }

    /// Creates a record, assigns its id and writes `attributes`.
    ///
    /// Stops at the first failing assignment; values written before it
    /// stay written.
    pub fn create<I, K, V>(&self, attributes: I) -> CoreResult<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut record = self.new_record();
        record.id()?;
        record.assign_attributes(attributes)?;
        Ok(record)
    }

    /// Returns the record with `id` if it exists.
    pub fn find(&self, id: ModelId) -> CoreResult<Option<Record>> {
        self.registry.find(&self.name, id)
    }

    /// Returns the record owning `value` of a searchable property.
    pub fn find_by_property(&self, property: &str, value: &str) -> CoreResult<Option<Record>> {
        self.registry.find_by_property(&self.name, property, value)
    }

    /// Enumerates all records of this type.
    pub fn all(&self) -> CoreResult<Records> {
        self.registry.all_of(&self.name)
    }

    /// Resolves the connection of this type.
    pub fn connection(&self) -> CoreResult<Connection> {
        self.registry.connection_for(&self.name)
    }

    /// Sets or clears the connection override of this type.
    pub fn set_connection(&self, connection: Option<Connection>) -> CoreResult<()> {
        self.registry.set_connection_for(&self.name, connection)
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry) && self.name == other.name
    }
}

impl Eq for Model {}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Model").field(&self.name).finish()
    }
}
