//! # kvrecord Core
//!
//! Attribute-mapped model persistence over a key-value store.
//!
//! This crate provides:
//! - Schema registry with property declarations and type inheritance
//! - Identity allocation from per-type counters
//! - Uniqueness index for searchable properties
//! - Collection catalog enumerating live records
//! - Connection resolution per type and per record
//! - Records with a generic, schema-checked accessor path
//!
//! ## Example
//!
//! ```rust
//! use kvrecord_backend::InMemoryBackend;
//! use kvrecord_core::{Connection, CoreError, Registry};
//!
//! let registry = Registry::new(Connection::new(InMemoryBackend::new()));
//! let users = registry.define_model("User", None).unwrap();
//! users.property("name").unwrap();
//! users.searchable("email").unwrap();
//!
//! let mut steve = users.new_record();
//! steve.set("name", "steve").unwrap();
//! steve.set("email", "steve@example.com").unwrap();
//!
//! let mut other = users.new_record();
//! assert!(matches!(
//!     other.set("email", "steve@example.com"),
//!     Err(CoreError::NotUnique { .. })
//! ));
//!
//! let mut found = users
//!     .find_by_property("email", "steve@example.com")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(found.get("name").unwrap().as_deref(), Some("steve"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod attributes;
mod catalog;
mod config;
mod connection;
mod error;
mod identity;
mod index;
pub mod keys;
mod model;
mod record;
mod registry;
mod schema;
mod stats;
mod types;

pub use attributes::AttributeStore;
pub use catalog::{CollectionCatalog, Records, MAX_SCORED_ID};
pub use config::{AttributeLayout, CatalogKind, Config};
pub use connection::{Connection, ConnectionResolver};
pub use error::{CoreError, CoreResult};
pub use identity::IdentityAllocator;
pub use index::UniquenessIndex;
pub use model::Model;
pub use record::Record;
pub use registry::Registry;
pub use schema::{ModelSchema, PropertyDescriptor, PropertyOptions, SchemaRegistry, ID_PROPERTY};
pub use stats::{RegistryStats, StatsSnapshot};
pub use types::{ModelId, TypeName};
