//! Core type definitions for kvrecord.

use heck::ToSnakeCase;
use std::fmt;
use std::sync::Arc;

/// Identifier of a persisted record.
///
/// Identifiers come from a per-type counter in the backend. They are
/// positive, never reused, and immutable once assigned to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(pub u64);

impl ModelId {
    /// Creates a new model ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Parses an identifier as stored in the backend.
    ///
    /// Returns `None` unless `s` is a positive decimal integer in the
    /// form [`Display`](fmt::Display) writes it: no sign, no leading zeros.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u64>().ok().map(Self)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ModelId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Name of a model type, as declared (`"TestClass"`).
///
/// Backend keys use [`TypeName::storage_name`], the snake_case form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Creates a type name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the name as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the key prefix used for this type (`TestClass` → `test_class`).
    #[must_use]
    pub fn storage_name(&self) -> String {
        self.0.to_snake_case()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
