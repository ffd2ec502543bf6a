//! Model schemas.
//!
//! Every model type has a [`ModelSchema`]: an optional parent type and
//! the ordered list of properties it declares. Property lookup walks the
//! explicit parent chain, so a subtype sees every property of its
//! ancestors, and the implicit `id` property exists on all of them.

mod descriptor;
mod registry;

pub use descriptor::{PropertyDescriptor, PropertyOptions, ID_PROPERTY};
pub use registry::{ModelSchema, SchemaRegistry};
