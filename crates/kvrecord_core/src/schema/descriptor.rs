//! Property descriptors and declaration options.

use std::sync::Arc;

/// Name of the implicit identifier property.
pub const ID_PROPERTY: &str = "id";

/// A declared property of a model type.
///
/// Descriptors are immutable once declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyDescriptor {
    name: Arc<str>,
    searchable: bool,
}

impl PropertyDescriptor {
    /// Creates a descriptor.
    pub fn new(name: impl AsRef<str>, searchable: bool) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            searchable,
        }
    }

    /// The implicit `id` descriptor.
    pub(crate) fn id() -> Self {
        Self::new(ID_PROPERTY, false)
    }

    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if values of this property are uniqueness-indexed.
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    /// Returns true for the implicit `id` property.
    #[must_use]
    pub fn is_id(&self) -> bool {
        &*self.name == ID_PROPERTY
    }
}

/// Options accepted when declaring a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyOptions {
    /// Index values for uniqueness and lookup.
    pub searchable: bool,
}

impl PropertyOptions {
    /// Creates default options.
    #[must_use]
    pub const fn new() -> Self {
        Self { searchable: false }
    }

    /// Sets whether the property is searchable.
    #[must_use]
    pub const fn searchable(mut self, value: bool) -> Self {
        self.searchable = value;
        self
    }

    /// Builds options from `(key, value)` pairs.
    ///
    /// On an unrecognized key, returns that key as the error.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut options = Self::new();
        for (key, value) in pairs {
            match key {
                "searchable" => options.searchable = value,
                other => return Err(other.to_string()),
            }
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_accessors() {
        let d = PropertyDescriptor::new("email", true);
        assert_eq!(d.name(), "email");
        assert!(d.is_searchable());
        assert!(!d.is_id());
        assert!(PropertyDescriptor::id().is_id());
    }

    #[test]
    fn options_from_pairs() {
        assert_eq!(
            PropertyOptions::from_pairs([]).unwrap(),
            PropertyOptions::new()
        );
        assert!(
            PropertyOptions::from_pairs([("searchable", true)])
                .unwrap()
                .searchable
        );
        assert!(
            !PropertyOptions::from_pairs([("searchable", false)])
                .unwrap()
                .searchable
        );
        assert_eq!(
            PropertyOptions::from_pairs([("searchable", true), ("unique", true)]),
            Err("unique".to_string())
        );
    }
}
