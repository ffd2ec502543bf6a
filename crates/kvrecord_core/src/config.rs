//! Registry configuration.

use serde::{Deserialize, Serialize};

/// How a record's property values are laid out in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeLayout {
    /// One hash per record at `{type}:id:{id}:hash`, one field per property.
    #[default]
    Hash,
    /// One string key per property at `{type}:id:{id}:{property}`.
    Keys,
}

/// Which backend structure holds the collection catalog at `{type}:all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    /// Sorted set scored by id; enumerates in id order.
    #[default]
    SortedSet,
    /// List; enumerates in registration order.
    List,
    /// Plain set; enumeration order is unspecified.
    Set,
}

/// Configuration for a [`crate::Registry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Attribute storage layout.
    pub layout: AttributeLayout,

    /// Catalog structure.
    pub catalog: CatalogKind,

    /// Claim uniqueness entries with `SETNX` instead of a plain `SET`.
    ///
    /// With this off, two writers racing for the same unclaimed value
    /// both succeed and the last one owns the entry.
    pub conditional_claims: bool,

    /// Release a record's uniqueness claims when it is destroyed.
    pub release_claims_on_destroy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: AttributeLayout::Hash,
            catalog: CatalogKind::SortedSet,
            conditional_claims: true,
            release_claims_on_destroy: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the attribute layout.
    #[must_use]
    pub const fn layout(mut self, layout: AttributeLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the catalog structure.
    #[must_use]
    pub const fn catalog(mut self, catalog: CatalogKind) -> Self {
        self.catalog = catalog;
        self
    }

    /// Sets whether uniqueness claims use a conditional set.
    #[must_use]
    pub const fn conditional_claims(mut self, value: bool) -> Self {
        self.conditional_claims = value;
        self
    }

    /// Sets whether destroy releases uniqueness claims.
    #[must_use]
    pub const fn release_claims_on_destroy(mut self, value: bool) -> Self {
        self.release_claims_on_destroy = value;
        self
    }
}
