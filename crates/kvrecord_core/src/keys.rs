//! Backend key naming.
//!
//! These layouts are shared with existing stores and must not change:
//!
//! | key                               | holds                              |
//! |-----------------------------------|------------------------------------|
//! | `{type}:counter`                  | id sequence                        |
//! | `{type}:id:{id}`                  | existence marker                   |
//! | `{type}:id:{id}:hash`             | property values, one field each    |
//! | `{type}:id:{id}:{property}`       | one property value                 |
//! | `{type}:all`                      | collection catalog                 |
//! | `{type}:{property}:{value}`       | uniqueness claim, value is the id  |

use crate::types::ModelId;

/// Id sequence for a type.
pub fn counter(storage: &str) -> String {
    format!("{storage}:counter")
}

/// Existence marker for a record.
pub fn existence(storage: &str, id: ModelId) -> String {
    format!("{storage}:id:{id}")
}

/// Hash holding all property values of a record.
pub fn attributes_hash(storage: &str, id: ModelId) -> String {
    format!("{storage}:id:{id}:hash")
}

/// String key holding a single property value of a record.
pub fn attribute(storage: &str, id: ModelId, property: &str) -> String {
    format!("{storage}:id:{id}:{property}")
}

/// Collection catalog of a type.
pub fn catalog(storage: &str) -> String {
    format!("{storage}:all")
}

/// Uniqueness claim for a property value.
pub fn unique(storage: &str, property: &str, value: &str) -> String {
    format!("{storage}:{property}:{value}")
}
