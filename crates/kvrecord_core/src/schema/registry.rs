//! Schema registry.

use crate::error::{CoreError, CoreResult};
use crate::schema::descriptor::{PropertyDescriptor, PropertyOptions, ID_PROPERTY};
use crate::types::TypeName;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Schema of one model type.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: TypeName,
    storage_name: String,
    parent: Option<TypeName>,
    /// Own properties in declaration order; excludes `id` and inherited ones.
    properties: Vec<PropertyDescriptor>,
}

impl ModelSchema {
    fn new(name: TypeName, parent: Option<TypeName>) -> Self {
        Self {
            storage_name: name.storage_name(),
            name,
            parent,
            properties: Vec::new(),
        }
    }

    /// Returns the type name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Returns the key prefix for this type.
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    /// Returns the parent type, if any.
    pub fn parent(&self) -> Option<&TypeName> {
        self.parent.as_ref()
    }

    /// Returns the properties declared directly on this type.
    pub fn own_properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }
}

/// Holds the schema of every defined model type.
///
/// Types can be defined at any point in the registry's lifetime but are
/// never removed, and declared properties are never changed.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    types: RwLock<HashMap<TypeName, ModelSchema>>,
}

impl SchemaRegistry {
    /// Creates an empty schema registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a model type.
    ///
    /// Defining an existing type again with the same parent is a no-op.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnknownType`] if `parent` is not defined
    /// - [`CoreError::TypeConflict`] if the type exists with another parent,
    ///   or another type already uses the same key prefix
    pub fn define(&self, name: &TypeName, parent: Option<&TypeName>) -> CoreResult<()> {
        let mut types = self.types.write();

        if let Some(existing) = types.get(name) {
            if existing.parent.as_ref() == parent {
                return Ok(());
            }
            return Err(CoreError::type_conflict(
                name.as_str(),
                format!(
                    "already defined with parent {:?}",
                    existing.parent.as_ref().map(TypeName::as_str)
                ),
            ));
        }

        if let Some(parent) = parent {
            if !types.contains_key(parent) {
                return Err(CoreError::unknown_type(parent.as_str()));
            }
        }

        let schema = ModelSchema::new(name.clone(), parent.cloned());
        if let Some(clash) = types
            .values()
            .find(|s| s.storage_name == schema.storage_name)
        {
            return Err(CoreError::type_conflict(
                name.as_str(),
                format!(
                    "key prefix {} is already used by {}",
                    schema.storage_name, clash.name
                ),
            ));
        }

        debug!(model = %name, parent = ?parent.map(TypeName::as_str), "defined model type");
        types.insert(name.clone(), schema);
        Ok(())
    }

    /// Returns true if the type is defined.
    pub fn contains(&self, name: &TypeName) -> bool {
        self.types.read().contains_key(name)
    }

    /// Returns a copy of a type's schema.
    pub fn schema(&self, name: &TypeName) -> CoreResult<ModelSchema> {
        self.types
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::unknown_type(name.as_str()))
    }

    /// Returns the key prefix for a type.
    pub fn storage_name(&self, name: &TypeName) -> CoreResult<String> {
        self.types
            .read()
            .get(name)
            .map(|s| s.storage_name.clone())
            .ok_or_else(|| CoreError::unknown_type(name.as_str()))
    }

    /// Returns the type followed by its ancestors, nearest first.
    pub fn lineage(&self, name: &TypeName) -> CoreResult<Vec<TypeName>> {
        let types = self.types.read();
        let mut chain = Vec::new();
        let mut current = Some(name.clone());
        while let Some(ty) = current {
            let schema = types
                .get(&ty)
                .ok_or_else(|| CoreError::unknown_type(ty.as_str()))?;
            current = schema.parent.clone();
            chain.push(ty);
        }
        Ok(chain)
    }

    /// Declares a property on a type.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnknownType`] if the type is not defined
    /// - [`CoreError::InvalidPropertyOption`] on an unrecognized option
    /// - [`CoreError::PropertyExists`] if the name is `id` or already
    ///   declared on the type or one of its ancestors
    pub fn declare<'a, I>(
        &self,
        model: &TypeName,
        name: &str,
        options: I,
    ) -> CoreResult<PropertyDescriptor>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let options = PropertyOptions::from_pairs(options).map_err(|option| {
            CoreError::InvalidPropertyOption {
                model: model.to_string(),
                property: name.to_string(),
                option,
            }
        })?;

        let mut types = self.types.write();
        if !types.contains_key(model) {
            return Err(CoreError::unknown_type(model.as_str()));
        }

        if name == ID_PROPERTY || Self::find_in(&types, model, name).is_some() {
            return Err(CoreError::property_exists(model.as_str(), name));
        }

        let descriptor = PropertyDescriptor::new(name, options.searchable);
        if let Some(schema) = types.get_mut(model) {
            schema.properties.push(descriptor.clone());
        }

        debug!(model = %model, property = name, searchable = options.searchable, "declared property");
        Ok(descriptor)
    }

    /// Returns every property of a type: `id`, then inherited properties
    /// from the root ancestor down, then the type's own, each in
    /// declaration order.
    pub fn properties_of(&self, model: &TypeName) -> CoreResult<Vec<PropertyDescriptor>> {
        let lineage = self.lineage(model)?;
        let types = self.types.read();

        let mut properties = vec![PropertyDescriptor::id()];
        for ty in lineage.iter().rev() {
            if let Some(schema) = types.get(ty) {
                properties.extend(schema.properties.iter().cloned());
            }
        }
        Ok(properties)
    }

    /// Looks up a property by name, including `id` and inherited properties.
    pub fn descriptor(
        &self,
        model: &TypeName,
        name: &str,
    ) -> CoreResult<Option<PropertyDescriptor>> {
        let types = self.types.read();
        if !types.contains_key(model) {
            return Err(CoreError::unknown_type(model.as_str()));
        }
        if name == ID_PROPERTY {
            return Ok(Some(PropertyDescriptor::id()));
        }
        Ok(Self::find_in(&types, model, name))
    }

    fn find_in(
        types: &HashMap<TypeName, ModelSchema>,
        model: &TypeName,
        name: &str,
    ) -> Option<PropertyDescriptor> {
        let mut current = types.get(model);
        while let Some(schema) = current {
            if let Some(d) = schema.properties.iter().find(|d| d.name() == name) {
                return Some(d.clone());
            }
            current = schema.parent.as_ref().and_then(|p| types.get(p));
        }
        None
    }
}
