//! Error types for kvrecord core.

use kvrecord_backend::BackendError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in kvrecord core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Backend error, passed through unchanged.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A property with this name is already declared on the model.
    #[error("property {property} already exists on {model}")]
    PropertyExists {
        /// The model type.
        model: String,
        /// The property name.
        property: String,
    },

    /// A property declaration used an unrecognized option.
    #[error("invalid option {option} for property {property} on {model}")]
    InvalidPropertyOption {
        /// The model type.
        model: String,
        /// The property name.
        property: String,
        /// The unrecognized option key.
        option: String,
    },

    /// A searchable value is already claimed by another record.
    #[error("a {model} with {property} = {value:?} already exists")]
    NotUnique {
        /// The model type.
        model: String,
        /// The property name.
        property: String,
        /// The contested value.
        value: String,
    },

    /// Access to a property the model does not declare.
    #[error("unknown attribute: {name} on {model}")]
    UnknownAttribute {
        /// The model type.
        model: String,
        /// The requested attribute.
        name: String,
    },

    /// The requested accessor does not exist (for example `id=`).
    #[error("no such accessor {accessor} on {model}")]
    NoSuchAccessor {
        /// The model type.
        model: String,
        /// The accessor name.
        accessor: String,
    },

    /// Lookup by a property that was not declared searchable.
    #[error("property {property} on {model} is not searchable")]
    NotSearchable {
        /// The model type.
        model: String,
        /// The property name.
        property: String,
    },

    /// The model type has not been defined.
    #[error("unknown model type: {name}")]
    UnknownType {
        /// The type name.
        name: String,
    },

    /// A model type definition clashes with an existing one.
    #[error("conflicting definition of {name}: {message}")]
    TypeConflict {
        /// The type name.
        name: String,
        /// Description of the conflict.
        message: String,
    },

    /// An identifier cannot be stored exactly as a sorted-set score.
    #[error("id {id} at {key} exceeds the largest exact sorted-set score")]
    IdOutOfRange {
        /// The catalog key.
        key: String,
        /// The identifier.
        id: u64,
    },

    /// The backend holds a value that is not a valid identifier.
    #[error("corrupt entry at {key}: {value:?}")]
    CorruptEntry {
        /// The key read.
        key: String,
        /// The unparsable value.
        value: String,
    },
}

impl CoreError {
    /// Creates a property exists error.
    pub fn property_exists(model: impl Into<String>, property: impl Into<String>) -> Self {
        Self::PropertyExists {
            model: model.into(),
            property: property.into(),
        }
    }

    /// Creates a not unique error.
    pub fn not_unique(
        model: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::NotUnique {
            model: model.into(),
            property: property.into(),
            value: value.into(),
        }
    }

    /// Creates an unknown attribute error.
    pub fn unknown_attribute(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            model: model.into(),
            name: name.into(),
        }
    }

    /// Creates an unknown type error.
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    /// Creates a type conflict error.
    pub fn type_conflict(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeConflict {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a corrupt entry error.
    pub fn corrupt_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::CorruptEntry {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns true if this error came from the backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
